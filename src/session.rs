// Command handlers tying rendering, styling, export and history together

use crate::batch::{self, BatchItem};
use crate::error::{Error, Result};
use crate::export::{self, Artifact, ExportFormat};
use crate::history::{History, HistoryEntry};
use crate::logo;
use crate::pattern;
use crate::payload::{PayloadKind, PayloadRequest};
use crate::render;
use crate::store::KeyValueStore;
use crate::style::{LogoImage, StyleConfig};
use image::RgbaImage;

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Error,
}

/// Short message reported back to the user after a command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        let notice = Self {
            level: Level::Success,
            message: message.into(),
        };
        log::info!("{}", notice.message);
        notice
    }

    pub fn error(message: impl Into<String>) -> Self {
        let notice = Self {
            level: Level::Error,
            message: message.into(),
        };
        log::warn!("{}", notice.message);
        notice
    }
}

/// The displayed result of one generation
#[derive(Debug, Clone)]
pub struct RenderHandle {
    pub generation: u64,
    pub kind: PayloadKind,
    pub payload: String,
    pub style: StyleConfig,
    plane: RgbaImage,
}

impl RenderHandle {
    pub fn plane(&self) -> &RgbaImage {
        &self.plane
    }
}

/// A render plus the notices it produced
#[derive(Debug, Clone)]
pub struct Generation {
    pub handle: RenderHandle,
    pub notices: Vec<Notice>,
}

/// Pending logo composite for a given generation
#[derive(Debug, Clone)]
pub struct LogoJob {
    generation: u64,
    logo: LogoImage,
}

/// How a logo job ended. Exactly one outcome fires per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOutcome {
    Composited,
    Failed(String),
    /// A newer generation started before the job completed
    Superseded,
}

/// Result of a batch run
#[derive(Debug, Clone)]
pub struct BatchRun {
    pub items: Vec<BatchItem>,
    pub notices: Vec<Notice>,
}

/// Explicit state of one user session: the history store and the
/// generation counter.
pub struct Session<S: KeyValueStore> {
    history: History<S>,
    generation: u64,
}

impl<S: KeyValueStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self {
            history: History::new(store),
            generation: 0,
        }
    }

    pub fn history(&self) -> &History<S> {
        &self.history
    }

    /// Latest generation number handed out
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Validate the request, render it and record it in history.
    ///
    /// Validation and capacity errors abort before anything is stored. A
    /// history write failure is reported as an error notice but the render
    /// is still returned.
    pub fn generate(
        &mut self,
        request: &PayloadRequest,
        style: &StyleConfig,
    ) -> Result<Generation> {
        let payload = request.build()?;
        let mut generation = self.render(request.kind(), payload, style)?;

        let recorded = self
            .history
            .record(generation.handle.kind, &generation.handle.payload, style);
        if let Err(e) = recorded {
            generation
                .notices
                .push(Notice::error(format!("Could not save to history: {}", e)));
        }
        Ok(generation)
    }

    /// Re-render a history entry with its stored style. No new entry is written.
    pub fn restore(&mut self, id: i64) -> Result<(HistoryEntry, Generation)> {
        let entry = self
            .history
            .find(id)
            .ok_or_else(|| Error::Validation(format!("No history entry with id {}", id)))?;
        let mut generation = self.render(entry.kind, entry.data.clone(), &entry.style)?;
        generation.notices.push(Notice::success("Loaded from history"));
        Ok((entry, generation))
    }

    pub fn delete(&mut self, id: i64) -> Result<Notice> {
        if self.history.delete(id)? {
            Ok(Notice::success("Deleted from history"))
        } else {
            Ok(Notice::error(format!("No history entry with id {}", id)))
        }
    }

    pub fn clear(&mut self) -> Result<Notice> {
        self.history.clear()?;
        Ok(Notice::success("History cleared"))
    }

    /// Export the current render; `None` when nothing was generated yet
    pub fn export(
        &self,
        handle: Option<&RenderHandle>,
        format: ExportFormat,
    ) -> Result<(Artifact, Notice)> {
        let style = handle.map(|h| h.style.clone()).unwrap_or_default();
        let artifact = export::export(handle.map(|h| h.plane()), &style, format)?;
        let notice = Notice::success(format!(
            "Downloaded as {}",
            format.extension().to_uppercase()
        ));
        Ok((artifact, notice))
    }

    /// Render every CSV row as an 80px thumbnail with the style's colors
    pub fn batch(&self, csv_text: &str, style: &StyleConfig) -> Result<BatchRun> {
        let entries = batch::parse_csv(csv_text)?;
        if entries.is_empty() {
            return Err(Error::Asset("CSV file is empty".to_string()));
        }
        let items = batch::render_batch(&entries, style.foreground, style.background);
        let notices = vec![Notice::success(format!("Generated {} QR codes", items.len()))];
        Ok(BatchRun { items, notices })
    }

    /// Start a logo composite for `handle`. Returns `None` when the style
    /// carries no logo.
    pub fn begin_logo(&self, handle: &RenderHandle) -> Option<LogoJob> {
        handle.style.logo.as_ref().map(|logo| LogoJob {
            generation: handle.generation,
            logo: logo.clone(),
        })
    }

    /// Finish a logo composite. A job from an older generation is
    /// discarded so it never paints over a newer render.
    pub fn complete_logo(&self, handle: &mut RenderHandle, job: LogoJob) -> LogoOutcome {
        if job.generation != self.generation || handle.generation != job.generation {
            log::debug!(
                "dropping logo for generation {} (latest is {})",
                job.generation,
                self.generation
            );
            return LogoOutcome::Superseded;
        }
        match logo::overlay(&mut handle.plane, &job.logo, handle.style.background) {
            Ok(()) => LogoOutcome::Composited,
            Err(e) => LogoOutcome::Failed(e.to_string()),
        }
    }

    fn render(
        &mut self,
        kind: PayloadKind,
        payload: String,
        style: &StyleConfig,
    ) -> Result<Generation> {
        let plane = render::render(&payload, style)?;
        let plane = pattern::reshape(&plane, style.pattern, style.foreground, style.background)?;

        self.generation += 1;
        let mut handle = RenderHandle {
            generation: self.generation,
            kind,
            payload,
            style: style.clone(),
            plane,
        };

        let notice = match &style.logo {
            None => Notice::success("QR code generated successfully!"),
            Some(logo) => match logo::overlay(&mut handle.plane, logo, style.background) {
                Ok(()) => Notice::success("QR code generated with logo!"),
                Err(e) => {
                    log::warn!("{}", e);
                    Notice::success("QR code generated (logo failed to load)")
                }
            },
        };

        Ok(Generation {
            handle,
            notices: vec![notice],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::color::Color;
    use crate::payload::WifiEncryption;
    use crate::store::MemoryStore;
    use crate::style::ModulePattern;
    use image::{ImageOutputFormat, Rgba};
    use std::io::Cursor;

    fn url(u: &str) -> PayloadRequest {
        PayloadRequest::Url { url: u.to_string() }
    }

    fn png_logo() -> LogoImage {
        let img = RgbaImage::from_pixel(8, 8, Rgba([200, 0, 0, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        LogoImage::from_bytes(bytes)
    }

    #[test]
    fn test_generate_records_history() {
        let mut session = Session::new(MemoryStore::new());
        let generation = session.generate(&url("example.com"), &StyleConfig::default()).unwrap();

        assert_eq!(generation.handle.payload, "https://example.com");
        assert_eq!(generation.handle.generation, 1);
        assert_eq!(generation.notices, vec![Notice::success("QR code generated successfully!")]);

        let entries = session.history().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, PayloadKind::Url);
        assert_eq!(entries[0].data, "https://example.com");
    }

    #[test]
    fn test_validation_error_mutates_nothing() {
        let mut session = Session::new(MemoryStore::new());
        let request = PayloadRequest::Wifi {
            ssid: String::new(),
            password: "pw".to_string(),
            encryption: WifiEncryption::Wpa,
        };
        let result = session.generate(&request, &StyleConfig::default());
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(session.generation(), 0);
        assert!(session.history().entries().is_empty());
    }

    #[test]
    fn test_capacity_error_mutates_nothing() {
        let mut session = Session::new(MemoryStore::new());
        let request = PayloadRequest::Text { text: "z".repeat(5000) };
        let result = session.generate(&request, &StyleConfig::default());
        assert!(matches!(result, Err(Error::Capacity(_))));
        assert!(session.history().entries().is_empty());
    }

    #[test]
    fn test_history_failure_keeps_render() {
        let mut session = Session::new(MemoryStore::with_quota(10));
        let generation = session.generate(&url("example.com"), &StyleConfig::default()).unwrap();
        assert_eq!(generation.notices.len(), 2);
        assert_eq!(generation.notices[1].level, Level::Error);
        assert!(generation.notices[1].message.starts_with("Could not save to history"));
    }

    #[test]
    fn test_restore_reproduces_grid() {
        let mut session = Session::new(MemoryStore::new());
        let style = StyleConfig {
            render_size: 330,
            foreground: Color::new(20, 20, 80),
            pattern: ModulePattern::Rounded,
            ..StyleConfig::default()
        };
        let original = session.generate(&url("https://example.com/restore"), &style).unwrap();
        let id = session.history().entries()[0].id;

        let (entry, restored) = session.restore(id).unwrap();
        assert_eq!(entry.style, style);
        assert_eq!(restored.handle.style, style);
        assert_eq!(
            classify(restored.handle.plane(), style.foreground),
            classify(original.handle.plane(), style.foreground)
        );
        assert_eq!(restored.notices.last().unwrap().message, "Loaded from history");
        // Restoring does not add an entry
        assert_eq!(session.history().entries().len(), 1);
    }

    #[test]
    fn test_restore_unknown_id() {
        let mut session = Session::new(MemoryStore::new());
        assert!(matches!(session.restore(42), Err(Error::Validation(_))));
    }

    #[test]
    fn test_logo_success_and_failure_notices() {
        let mut session = Session::new(MemoryStore::new());
        let mut style = StyleConfig {
            logo: Some(png_logo()),
            ..StyleConfig::default()
        };
        let with_logo = session.generate(&url("example.com"), &style).unwrap();
        assert_eq!(with_logo.notices[0].message, "QR code generated with logo!");
        assert_eq!(*with_logo.handle.plane().get_pixel(200, 200), Rgba([200, 0, 0, 255]));

        style.logo = Some(LogoImage::from_bytes(b"garbage".to_vec()));
        let without = session.generate(&url("example.com"), &style).unwrap();
        assert_eq!(without.notices[0].message, "QR code generated (logo failed to load)");
        assert_eq!(without.notices[0].level, Level::Success);
    }

    #[test]
    fn test_current_logo_job_composites() {
        let mut session = Session::new(MemoryStore::new());
        let mut latest = session.generate(&url("latest.com"), &StyleConfig::default()).unwrap();
        assert!(session.begin_logo(&latest.handle).is_none());

        latest.handle.style.logo = Some(png_logo());
        let job = session.begin_logo(&latest.handle).unwrap();
        assert_eq!(session.complete_logo(&mut latest.handle, job), LogoOutcome::Composited);
        assert_eq!(*latest.handle.plane().get_pixel(200, 200), Rgba([200, 0, 0, 255]));

        latest.handle.style.logo = Some(LogoImage::from_bytes(b"garbage".to_vec()));
        let job = session.begin_logo(&latest.handle).unwrap();
        assert!(matches!(
            session.complete_logo(&mut latest.handle, job),
            LogoOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_stale_logo_job_is_discarded() {
        let mut session = Session::new(MemoryStore::new());
        let style = StyleConfig {
            logo: Some(png_logo()),
            ..StyleConfig::default()
        };
        let mut first = session.generate(&url("first.com"), &StyleConfig::default()).unwrap();
        first.handle.style = style.clone();
        let job = session.begin_logo(&first.handle).unwrap();

        // A newer request supersedes the first before its logo completes
        session.generate(&url("second.com"), &StyleConfig::default()).unwrap();

        let before = first.handle.plane().clone();
        let outcome = session.complete_logo(&mut first.handle, job);
        assert_eq!(outcome, LogoOutcome::Superseded);
        assert_eq!(first.handle.plane(), &before);
    }

    #[test]
    fn test_export_and_batch() {
        let mut session = Session::new(MemoryStore::new());
        assert!(matches!(
            session.export(None, ExportFormat::Png),
            Err(Error::Validation(_))
        ));

        let generation = session.generate(&url("example.com"), &StyleConfig::default()).unwrap();
        let (artifact, notice) = session
            .export(Some(&generation.handle), ExportFormat::Svg)
            .unwrap();
        assert_eq!(artifact.file_name, "qrcode.svg");
        assert_eq!(notice.message, "Downloaded as SVG");

        let run = session
            .batch("https://a.com,Site A\nhttps://b.com\n", &StyleConfig::default())
            .unwrap();
        assert_eq!(run.items.len(), 2);
        assert_eq!(run.notices[0].message, "Generated 2 QR codes");

        assert!(matches!(
            session.batch("\n \n", &StyleConfig::default()),
            Err(Error::Asset(_))
        ));
    }

    #[test]
    fn test_delete_and_clear_notices() {
        let mut session = Session::new(MemoryStore::new());
        session.generate(&url("example.com"), &StyleConfig::default()).unwrap();
        let id = session.history().entries()[0].id;
        assert_eq!(session.delete(id).unwrap().message, "Deleted from history");
        assert_eq!(session.delete(id).unwrap().level, Level::Error);
        assert_eq!(session.clear().unwrap().message, "History cleared");
    }
}
