use std::fmt;

/// Holds a value that must stay on the server side.
///
/// Fault details (driver messages, connection strings, stack context) end up
/// in `Sensitive<String>` inside an
/// [`UnhandledError`](crate::UnhandledError). Formatting never shows the
/// value; the dispatcher reads it through [`expose`](Self::expose) only to
/// log it.
///
/// # Examples
///
/// ```
/// use dispatch_core::Sensitive;
///
/// let detail = Sensitive::new("timeout talking to 10.0.0.7:5432".to_string());
/// assert_eq!(format!("{:?}", detail), "[REDACTED]");
/// assert_eq!(detail.to_string(), "[REDACTED]");
/// assert!(detail.expose().contains("5432"));
/// ```
// No Clone, Copy, Default, Deref or AsRef: the only way to the value is expose().
pub struct Sensitive<T> {
    inner: T,
}

impl<T> Sensitive<T> {
    /// Wraps a value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Borrows the wrapped value. Callers must not forward it to clients.
    pub fn expose(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sensitive_redacts_debug_and_display() {
        let detail = Sensitive::new("password=hunter2".to_string());

        let debug_output = format!("{:?}", detail);
        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("String"));

        assert_eq!(format!("{}", detail), "[REDACTED]");
    }

    #[test]
    fn sensitive_redacts_when_nested() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Fault {
            detail: Sensitive<&'static str>,
        }

        let fault = Fault {
            detail: Sensitive::new("token=abc"),
        };
        assert!(!format!("{:?}", fault).contains("abc"));
    }

    #[test]
    fn sensitive_exposes_on_request() {
        let detail = Sensitive::new(42);
        assert_eq!(*detail.expose(), 42);
    }
}
