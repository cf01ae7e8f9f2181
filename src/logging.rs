use std::fmt;

/// Request-scoped logging.
///
/// Obtained from [`DispatchContext::log`](crate::DispatchContext::log) and
/// bound to its lifetime. Every event carries the request id.
///
/// Fault details wrapped in [`Sensitive`](crate::Sensitive) print as
/// `[REDACTED]` here like everywhere else.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// The request id stamped on every event.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs at debug level.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at info level.
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at warn level.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, "{}", args);
    }

    /// Logs at error level.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, "{}", args);
    }

    /// Logs a pipeline stage stopping the request.
    pub fn rejected(&self, stage: &'static str, reason: &dyn fmt::Display) {
        tracing::warn!(request_id = %self.request_id, stage, %reason, "request rejected");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carries_request_id() {
        let log = RequestLog::new("req-42");
        assert_eq!(log.request_id(), "req-42");
        // No subscriber installed: these must simply not panic.
        log.debug(format_args!("binding {}", "Id"));
        log.rejected("validation", &"2 violations");
    }
}
