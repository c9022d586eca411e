//! User-visible notices for failures that don't stop the conversation.

/// Shown when an empty page identity is activated.
pub const ENTER_URL: &str = "Please enter a URL";
/// Shown when the page content could not be read.
pub const PAGE_CONTENT_FAILED: &str = "Failed to load page content";
/// Shown when suggested questions could not be fetched.
pub const SUGGESTIONS_FAILED: &str = "Failed to load suggested questions";
/// Shown when a question could not be answered.
pub const SEND_FAILED: &str = "Failed to send message";
/// Shown when the transcript could not be persisted.
pub const SAVE_FAILED: &str = "Failed to save chat history";
/// Shown when the stored transcript could not be removed.
pub const CLEAR_FAILED: &str = "Failed to clear chat history";

/// How serious a notice is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NoticeLevel {
    /// Something degraded, but the conversation works as usual.
    Warning,
    /// An operation the user asked for failed.
    Error,
}

/// A transient, dismissible notification.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Notice {
    id: u64,
    level: NoticeLevel,
    description: String,
}

impl Notice {
    /// Returns the identifier used to dismiss this notice.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the level of this notice.
    #[inline]
    pub fn level(&self) -> NoticeLevel {
        self.level
    }

    /// Returns a short title derived from the level.
    #[inline]
    pub fn title(&self) -> &'static str {
        match self.level {
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        }
    }

    /// Returns what happened.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }
}

/// The list of notices that have not been dismissed yet.
#[derive(Clone, Debug)]
pub(crate) struct Notices {
    items: Vec<Notice>,
    next_id: u64,
}

impl Default for Notices {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

impl Notices {
    pub fn push<S: Into<String>>(
        &mut self,
        level: NoticeLevel,
        description: S,
    ) -> Notice {
        let notice = Notice {
            id: self.next_id,
            level,
            description: description.into(),
        };
        self.next_id += 1;
        self.items.push(notice.clone());
        notice
    }

    /// Returns `false` if there was no such notice.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let len = self.items.len();
        self.items.retain(|notice| notice.id != id);
        self.items.len() != len
    }

    #[inline]
    pub fn items(&self) -> &[Notice] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_dismiss() {
        let mut notices = Notices::default();
        let first = notices.push(NoticeLevel::Error, SEND_FAILED);
        let second = notices.push(NoticeLevel::Warning, PAGE_CONTENT_FAILED);
        assert_ne!(first.id(), second.id());
        assert_eq!(first.title(), "Error");
        assert_eq!(notices.items().len(), 2);

        assert!(notices.dismiss(first.id()));
        assert!(!notices.dismiss(first.id()));
        assert_eq!(notices.items(), &[second]);
    }
}
