//! Loading indicator.
//!
//! The viewer shows one line of text while the model and the skin load,
//! switches it to an error style when something fails and hides it when
//! everything is in place. [`StatusSink`] is that indicator; the skin
//! pipeline and the model loader only ever talk to it through the trait.

/// Error text colour of the browser indicator.
pub const ERROR_COLOR: &str = "#ff5555";

pub trait StatusSink {
    /// Shows `text` as progress information.
    fn show(&mut self, text: &str);
    /// Shows `text` in the error style.
    fn error(&mut self, text: &str);
    fn hide(&mut self);
}

impl<T: StatusSink + ?Sized> StatusSink for &mut T {
    fn show(&mut self, text: &str) {
        (**self).show(text)
    }

    fn error(&mut self, text: &str) {
        (**self).error(text)
    }

    fn hide(&mut self) {
        (**self).hide()
    }
}

/// Last state of an indicator, for sinks that want to remember it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Hidden,
    Message(String),
    Error(String),
}

/// Writes indicator changes to the log. Used by native builds and the CLI.
#[derive(Debug, Default)]
pub struct LogStatus {
    current: Status,
}

impl LogStatus {
    pub fn current(&self) -> &Status {
        &self.current
    }
}

impl StatusSink for LogStatus {
    fn show(&mut self, text: &str) {
        log::info!("{text}");
        self.current = Status::Message(text.to_string());
    }

    fn error(&mut self, text: &str) {
        log::error!("{text}");
        self.current = Status::Error(text.to_string());
    }

    fn hide(&mut self) {
        if self.current != Status::Hidden {
            log::debug!("status hidden");
        }
        self.current = Status::Hidden;
    }
}

#[cfg(target_arch = "wasm32")]
pub use dom::DomStatus;

#[cfg(target_arch = "wasm32")]
mod dom {
    use wasm_bindgen::JsCast;

    use super::{ERROR_COLOR, StatusSink};

    /// Drives the page's `#loading` element.
    ///
    /// A page without that element silently gets log output only.
    #[derive(Debug, Default)]
    pub struct DomStatus;

    impl DomStatus {
        fn element() -> Option<web_sys::HtmlElement> {
            web_sys::window()?
                .document()?
                .get_element_by_id("loading")?
                .dyn_into::<web_sys::HtmlElement>()
                .ok()
        }

        fn update(text: Option<&str>, color: &str) {
            let Some(el) = Self::element() else {
                return;
            };
            let style = el.style();
            let display = if text.is_some() { "block" } else { "none" };
            if let Some(text) = text {
                el.set_text_content(Some(text));
            }
            if style.set_property("display", display).is_err()
                || style.set_property("color", color).is_err()
            {
                log::warn!("failed to style #loading");
            }
        }
    }

    impl StatusSink for DomStatus {
        fn show(&mut self, text: &str) {
            log::info!("{text}");
            Self::update(Some(text), "");
        }

        fn error(&mut self, text: &str) {
            log::error!("{text}");
            Self::update(Some(text), ERROR_COLOR);
        }

        fn hide(&mut self) {
            Self::update(None, "");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_status_tracks_last_state() {
        let mut status = LogStatus::default();
        status.show("Loading model... 50%");
        assert_eq!(status.current(), &Status::Message("Loading model... 50%".into()));
        status.error("Skin error: boom");
        assert_eq!(status.current(), &Status::Error("Skin error: boom".into()));
        (&mut status).hide();
        assert_eq!(status.current(), &Status::Hidden);
    }
}
