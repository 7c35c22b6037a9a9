use crate::error::{ContaError, Result};

/// Numeric display format for the rendered identifier suffix.
///
/// Parsed from the printf-style subset the `number_format` option accepts:
/// `%d` (no padding) or `%0<width>d` (zero-padded to a minimum width).
/// The width is a minimum, never a limit; values wider than the format
/// render in full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    width: usize,
}

impl NumberFormat {
    pub fn parse(spec: &str) -> Result<Self> {
        let inner = spec
            .strip_prefix('%')
            .and_then(|rest| rest.strip_suffix('d'))
            .ok_or_else(|| ContaError::Config(format!("unsupported number format {spec:?}")))?;

        if inner.is_empty() {
            return Ok(NumberFormat { width: 0 });
        }

        let digits = inner.strip_prefix('0').ok_or_else(|| {
            ContaError::Config(format!("number format {spec:?} must zero-pad, e.g. %05d"))
        })?;
        let width: usize = digits
            .parse()
            .map_err(|_| ContaError::Config(format!("bad width in number format {spec:?}")))?;
        if width == 0 || width > 32 {
            return Err(ContaError::Config(format!(
                "number format width must be between 1 and 32, got {width}"
            )));
        }

        Ok(NumberFormat { width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn render(&self, value: i64) -> String {
        let width = self.width;
        format!("{value:0width$}")
    }

    /// Renders the full identifier, `<prefix>-<padded value>`.
    pub fn render_id(&self, prefix: &str, value: i64) -> String {
        format!("{prefix}-{}", self.render(value))
    }
}

impl Default for NumberFormat {
    fn default() -> Self {
        NumberFormat { width: 5 }
    }
}
