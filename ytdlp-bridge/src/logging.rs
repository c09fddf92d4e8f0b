//! stderr logging in the `[yt_dlp_bridge] LEVEL: message` shape hosts grep for.

use std::fmt;

use tracing::{Event, Subscriber};
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, FormattedFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_TAG: &str = "yt_dlp_bridge";

const DEFAULT_FILTER: &str = "ytdlp_bridge=debug,yt_dlp=debug";

/// Event formatter: fixed tag, level, span fields, then the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct TaggedFormat;

impl<S, N> FormatEvent<S, N> for TaggedFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>
    ) -> fmt::Result {
        write!(writer, "[{LOG_TAG}] {}: ", event.metadata().level())?;

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                let extensions = span.extensions();
                if let Some(fields) = extensions.get::<FormattedFields<N>>()
                    && !fields.is_empty()
                {
                    write!(writer, "{{{fields}}} ")?;
                }
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Plain-text fmt layer using [`TaggedFormat`]; hosts capture these lines verbatim.
pub fn tagged_layer<S, W>(writer: W) -> tracing_subscriber::fmt::Layer<S, DefaultFields, TaggedFormat, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static
{
    tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(writer)
        .event_format(TaggedFormat)
}

/// Installs the stderr subscriber. Later calls are no-ops.
pub fn init() {
    let _ = tracing_subscriber::registry()
        .with(tagged_layer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_FILTER.into())
        )
        .try_init();
}

#[cfg(test)]
pub(crate) mod capture {
    use std::io;
    use std::sync::{Arc, Mutex};

    use tracing_subscriber::fmt::MakeWriter;
    use tracing_subscriber::layer::SubscriberExt;

    use super::tagged_layer;

    #[derive(Clone, Default)]
    pub struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        pub fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).to_string()
        }
    }

    impl io::Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    /// Runs `f` with a tagged-format subscriber writing into the returned buffer.
    pub fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::registry().with(tagged_layer(buffer.clone()));
        let result = tracing::subscriber::with_default(subscriber, f);
        (result, buffer.contents())
    }
}
