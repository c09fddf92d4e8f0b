//! Host-side progress receivers.
//!
//! A host hands the bridge an object it knows little about: the method that
//! accepts progress may have been renamed by the host's build. A receiver
//! therefore exposes its invokable members by name, and the bridge probes them
//! (see [`crate::dispatch`]).

pub type CallResult = Result<(), CallError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("no member named `{0}`")]
    NoSuchMember(String),

    #[error("object is not callable")]
    NotCallable,

    #[error("{0}")]
    Failed(String)
}

/// Member name conventionally used for progress reporting.
pub const ON_PROGRESS: &str = "onProgress";

pub trait ProgressReceiver {
    fn type_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Invokable members in enumeration order.
    fn members(&self) -> Vec<&str> {
        Vec::new()
    }

    fn invoke(&self, member: &str, _downloaded: u64, _total: u64) -> CallResult {
        Err(CallError::NoSuchMember(member.to_string()))
    }

    /// Invokes the receiver itself.
    fn call(&self, _downloaded: u64, _total: u64) -> CallResult {
        Err(CallError::NotCallable)
    }
}

type Method<'a> = Box<dyn Fn(u64, u64) -> CallResult + 'a>;

/// A receiver assembled from named closures, probed in registration order.
///
/// ```
/// use ytdlp_bridge::{CallError, MethodTable};
///
/// let receiver = MethodTable::new("HostProgress")
///     .method("toString", |_, _| Err(CallError::Failed("takes no arguments".into())))
///     .method("a", |downloaded, total| {
///         println!("{downloaded}/{total}");
///         Ok(())
///     });
/// ```
pub struct MethodTable<'a> {
    name: String,
    methods: Vec<(String, Method<'a>)>,
    direct: Option<Method<'a>>
}

impl<'a> MethodTable<'a> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
            direct: None
        }
    }

    /// A table with a single `onProgress` member.
    pub fn on_progress(f: impl Fn(u64, u64) + 'a) -> Self {
        Self::new("OnProgress").method(ON_PROGRESS, move |d, t| {
            f(d, t);
            Ok(())
        })
    }

    pub fn method(
        mut self,
        name: impl Into<String>,
        f: impl Fn(u64, u64) -> CallResult + 'a
    ) -> Self {
        self.methods.push((name.into(), Box::new(f)));
        self
    }

    pub fn callable(mut self, f: impl Fn(u64, u64) -> CallResult + 'a) -> Self {
        self.direct = Some(Box::new(f));
        self
    }
}

impl ProgressReceiver for MethodTable<'_> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn members(&self) -> Vec<&str> {
        self.methods.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn invoke(&self, member: &str, downloaded: u64, total: u64) -> CallResult {
        match self.methods.iter().find(|(name, _)| name == member) {
            Some((_, f)) => f(downloaded, total),
            None => Err(CallError::NoSuchMember(member.to_string()))
        }
    }

    fn call(&self, downloaded: u64, total: u64) -> CallResult {
        match self.direct {
            Some(ref f) => f(downloaded, total),
            None => Err(CallError::NotCallable)
        }
    }
}

/// A directly callable receiver with no members.
pub struct FnReceiver<F>(F);

pub fn from_fn<F: Fn(u64, u64)>(f: F) -> FnReceiver<F> {
    FnReceiver(f)
}

impl<F: Fn(u64, u64)> ProgressReceiver for FnReceiver<F> {
    fn type_name(&self) -> &str {
        "function"
    }

    fn call(&self, downloaded: u64, total: u64) -> CallResult {
        (self.0)(downloaded, total);
        Ok(())
    }
}
