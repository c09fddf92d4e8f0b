use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub uploader: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub formats: Vec<Format>,
    #[serde(default)]
    pub extractor: Option<String>,
    #[serde(default)]
    pub is_live: Option<bool>
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Format {
    #[serde(default)]
    pub format_id: Option<String>,
    #[serde(default)]
    pub format_note: Option<String>,
    #[serde(default)]
    pub ext: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub width: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<f64>,
    #[serde(default)]
    pub vcodec: Option<String>,
    #[serde(default)]
    pub acodec: Option<String>,
    #[serde(default)]
    pub abr: Option<f64>,
    #[serde(default)]
    pub vbr: Option<f64>,
    #[serde(default)]
    pub tbr: Option<f64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub filesize_approx: Option<u64>,
    #[serde(default)]
    pub protocol: Option<String>
}

impl Format {
    pub fn has_video(&self) -> bool {
        self.vcodec.as_ref().is_some_and(|v| v != "none")
    }

    pub fn has_audio(&self) -> bool {
        self.acodec.as_ref().is_some_and(|a| a != "none")
    }

    /// Exact size when known and non-zero, otherwise the approximate size.
    pub fn estimated_size(&self) -> Option<u64> {
        self.filesize
            .filter(|&s| s > 0)
            .or(self.filesize_approx.filter(|&s| s > 0))
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// Some extractors report sizes as floats (e.g. `filesize_approx: 1500.0`).
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>
{
    let value = Option::<f64>::deserialize(deserializer)?;
    Ok(value.filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>
{
    Ok(lenient_u64(deserializer)?.and_then(|v| u32::try_from(v).ok()))
}
