use crate::error::OptimizerError;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default base name of the trace artifact, relative to the working directory
pub const DEFAULT_LOG_BASE: &str = "log";

/// Line-oriented trace output for an optimization run.
///
/// Implementations must make `close` idempotent and ignore writes issued after it.
pub trait TraceSink {
    fn write(&mut self, line: &str) -> io::Result<()>;

    fn close(&mut self) -> io::Result<()>;
}

/// Trace formats selectable from configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputVariant {
    PlainText,
    Markup,
}

impl OutputVariant {
    pub fn extension(self) -> &'static str {
        match self {
            Self::PlainText => "txt",
            Self::Markup => "html",
        }
    }
}

impl FromStr for OutputVariant {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "txt" => Ok(Self::PlainText),
            "html" => Ok(Self::Markup),
            other => Err(OptimizerError::UnsupportedOutputVariant(other.to_string())),
        }
    }
}

/// Writes every line verbatim followed by a newline.
pub struct PlainTextSink<W: Write> {
    writer: Option<W>,
    closed: bool,
}

impl<W: Write> PlainTextSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Some(writer),
            closed: false,
        }
    }

    /// Close the sink and hand back the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.close()?;
        self.writer
            .take()
            .ok_or_else(|| io::Error::other("trace writer already taken"))
    }
}

impl<W: Write> TraceSink for PlainTextSink<W> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) if !self.closed => writeln!(w, "{line}"),
            _ => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.writer.as_mut() {
            Some(w) => w.flush(),
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for PlainTextSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close trace output: {}", e);
        }
    }
}

/// Wraps every line in a paragraph inside a minimal HTML document.
pub struct MarkupSink<W: Write> {
    writer: Option<W>,
    closed: bool,
}

impl<W: Write> MarkupSink<W> {
    /// Start the document; the header is written immediately.
    pub fn new(mut writer: W) -> io::Result<Self> {
        write!(writer, "<html>\n<head>\n<title>Log</title>\n</head>\n<body>\n")?;
        Ok(Self {
            writer: Some(writer),
            closed: false,
        })
    }

    /// Close the document and hand back the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.close()?;
        self.writer
            .take()
            .ok_or_else(|| io::Error::other("trace writer already taken"))
    }
}

impl<W: Write> TraceSink for MarkupSink<W> {
    fn write(&mut self, line: &str) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(w) if !self.closed => writeln!(w, "<p>{}</p>", escape_html(line)),
            _ => Ok(()),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        match self.writer.as_mut() {
            Some(w) => {
                write!(w, "</body>\n</html>")?;
                w.flush()
            }
            None => Ok(()),
        }
    }
}

impl<W: Write> Drop for MarkupSink<W> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            log::warn!("Failed to close trace output: {}", e);
        }
    }
}

fn escape_html(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    for c in line.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Path of the trace artifact for `base` in the given variant
pub fn trace_path(base: &Path, variant: OutputVariant) -> PathBuf {
    let mut name = base.as_os_str().to_owned();
    name.push(".");
    name.push(variant.extension());
    PathBuf::from(name)
}

impl OutputVariant {
    /// Create the trace file next to `base` (`log` -> `log.txt` / `log.html`).
    pub fn open(self, base: &Path) -> io::Result<Box<dyn TraceSink>> {
        let path = trace_path(base, self);
        let file = BufWriter::new(File::create(&path)?);

        log::debug!("Writing trace to {}", path.display());

        let sink: Box<dyn TraceSink> = match self {
            Self::PlainText => Box::new(PlainTextSink::new(file)),
            Self::Markup => Box::new(MarkupSink::new(file)?),
        };
        Ok(sink)
    }
}

/// Parse `variant` and open its trace file.
///
/// The variant is validated before anything touches the filesystem.
pub fn open_trace_sink(variant: &str, base: &Path) -> Result<Box<dyn TraceSink>, OptimizerError> {
    let variant: OutputVariant = variant.parse()?;
    Ok(variant.open(base)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn plain_text_writes_lines_verbatim() {
        let mut sink = PlainTextSink::new(Vec::new());
        sink.write("Step #1").unwrap();
        sink.write("X0=(0.000000)").unwrap();
        assert_eq!(text(sink.into_inner().unwrap()), "Step #1\nX0=(0.000000)\n");
    }

    #[test]
    fn markup_wraps_lines_in_paragraphs() {
        let mut sink = MarkupSink::new(Vec::new()).unwrap();
        sink.write("Step #1").unwrap();
        assert_eq!(
            text(sink.into_inner().unwrap()),
            "<html>\n<head>\n<title>Log</title>\n</head>\n<body>\n<p>Step #1</p>\n</body>\n</html>"
        );
    }

    #[test]
    fn markup_escapes_special_characters() {
        let mut sink = MarkupSink::new(Vec::new()).unwrap();
        sink.write("a < b & c").unwrap();
        assert!(text(sink.into_inner().unwrap()).contains("<p>a &lt; b &amp; c</p>"));
    }

    #[test]
    fn close_is_idempotent() {
        let mut once = MarkupSink::new(Vec::new()).unwrap();
        once.write("line").unwrap();
        once.close().unwrap();

        let mut twice = MarkupSink::new(Vec::new()).unwrap();
        twice.write("line").unwrap();
        twice.close().unwrap();
        twice.close().unwrap();

        let once = text(once.into_inner().unwrap());
        let twice = text(twice.into_inner().unwrap());
        assert_eq!(once, twice);
        assert_eq!(twice.matches("</html>").count(), 1);
    }

    #[test]
    fn writes_after_close_are_ignored() {
        let mut sink = PlainTextSink::new(Vec::new());
        sink.write("kept").unwrap();
        sink.close().unwrap();
        sink.write("dropped").unwrap();
        assert_eq!(text(sink.into_inner().unwrap()), "kept\n");
    }

    #[test]
    fn variant_parsing() {
        assert_eq!("txt".parse::<OutputVariant>().unwrap(), OutputVariant::PlainText);
        assert_eq!("html".parse::<OutputVariant>().unwrap(), OutputVariant::Markup);
        assert!(matches!(
            "pdf".parse::<OutputVariant>(),
            Err(OptimizerError::UnsupportedOutputVariant(v)) if v == "pdf"
        ));
    }

    #[test]
    fn trace_path_appends_extension() {
        assert_eq!(
            trace_path(Path::new("out/log"), OutputVariant::Markup),
            PathBuf::from("out/log.html")
        );
    }

    #[test]
    fn unsupported_variant_creates_no_file() {
        let dir = std::env::temp_dir().join(format!("simplex-trace-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("unsupported");

        assert!(open_trace_sink("xml", &base).is_err());
        assert!(!trace_path(&base, OutputVariant::PlainText).exists());
        assert!(!trace_path(&base, OutputVariant::Markup).exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn dropping_an_html_sink_finishes_the_document() {
        let dir = std::env::temp_dir().join(format!("simplex-trace-drop-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let base = dir.join("log");

        {
            let mut sink = open_trace_sink("html", &base).unwrap();
            sink.write("only line").unwrap();
        }

        let written = std::fs::read_to_string(trace_path(&base, OutputVariant::Markup)).unwrap();
        assert!(written.starts_with("<html>"));
        assert!(written.ends_with("</body>\n</html>"));

        std::fs::remove_dir_all(&dir).ok();
    }
}
