//! Memory push form

use crate::error::ValidationError;
use crate::model::MemoryPushRequest;

/// Raw memory push form input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryForm {
    /// Target application
    pub app_id: String,
    /// Wallet of the end user
    pub wallet_id: String,
    /// Business-side session
    pub session_id: String,
    /// Session history file
    pub filename: String,
    /// Optional description
    pub description: String,
    /// Optional summary threshold
    pub summary_threshold: String,
}

impl MemoryForm {
    /// Create form prefilled with the current application
    #[inline]
    #[must_use]
    pub fn for_app(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            ..Self::default()
        }
    }

    /// Validate and build the request body
    pub fn validate(&self) -> Result<MemoryPushRequest, ValidationError> {
        let required = |value: &str, name: &'static str| {
            let value = value.trim();
            if value.is_empty() {
                Err(ValidationError::MissingField(name))
            } else {
                Ok(value.to_string())
            }
        };

        let app_id = required(&self.app_id, "app_id")?;
        let wallet_id = required(&self.wallet_id, "wallet_id")?;
        let session_id = required(&self.session_id, "session_id")?;
        let filename = required(&self.filename, "filename")?;

        let description = self.description.trim();
        let threshold = self.summary_threshold.trim();
        let summary_threshold = if threshold.is_empty() {
            None
        } else {
            Some(
                threshold
                    .parse::<i64>()
                    .map_err(|_| ValidationError::InvalidThreshold(threshold.to_string()))?,
            )
        };

        Ok(MemoryPushRequest {
            app_id,
            wallet_id,
            session_id,
            filename,
            description: (!description.is_empty()).then(|| description.to_string()),
            summary_threshold,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> MemoryForm {
        MemoryForm {
            wallet_id: " w-1 ".into(),
            session_id: "s-1".into(),
            filename: "history.json".into(),
            ..MemoryForm::for_app("acme")
        }
    }

    #[test]
    fn valid_form_builds_request() {
        let req = filled().validate().unwrap();
        assert_eq!(req.app_id, "acme");
        assert_eq!(req.wallet_id, "w-1");
        assert!(req.description.is_none());
        assert!(req.summary_threshold.is_none());
    }

    #[test]
    fn required_fields_are_checked_in_order() {
        let form = MemoryForm::for_app("acme");
        assert_eq!(form.validate(), Err(ValidationError::MissingField("wallet_id")));

        let form = MemoryForm {
            app_id: "   ".into(),
            ..filled()
        };
        assert_eq!(form.validate(), Err(ValidationError::MissingField("app_id")));
    }

    #[test]
    fn threshold_must_be_integer() {
        let form = MemoryForm {
            summary_threshold: "ten".into(),
            ..filled()
        };
        assert_eq!(
            form.validate(),
            Err(ValidationError::InvalidThreshold("ten".into()))
        );

        let form = MemoryForm {
            summary_threshold: " 12 ".into(),
            description: "nightly import".into(),
            ..filled()
        };
        let req = form.validate().unwrap();
        assert_eq!(req.summary_threshold, Some(12));
        assert_eq!(req.description.as_deref(), Some("nightly import"));
    }
}
