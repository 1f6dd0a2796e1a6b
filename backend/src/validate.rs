use crate::config::Config;
use crate::error::ApiError;
use crate::models::RenderRequest;
use crate::render::{OutputFormat, PageDimensions};

#[derive(Debug)]
pub struct ValidatedRequest {
    pub html: String,
    pub dims: PageDimensions,
}

fn default_dims(format: OutputFormat) -> PageDimensions {
    match format {
        // A4 portrait in millimeters.
        OutputFormat::Pdf => PageDimensions {
            width: 210.0,
            height: 297.0,
        },
        OutputFormat::Png => PageDimensions {
            width: 1280.0,
            height: 720.0,
        },
    }
}

fn check_dimension(field: &'static str, value: f64, max: f64) -> Result<(), ApiError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ApiError::validation(field, "must be a positive number"));
    }
    if value > max {
        return Err(ApiError::validation(field, format!("must be at most {}", max)));
    }
    Ok(())
}

/// Checks the request against the configured bounds and resolves the
/// effective render dimensions. No side effects.
pub fn validate(
    req: &RenderRequest,
    config: &Config,
    format: OutputFormat,
) -> Result<ValidatedRequest, ApiError> {
    if req.html.trim().is_empty() {
        return Err(ApiError::validation("html", "must not be empty"));
    }
    if req.html.len() > config.max_html_bytes {
        return Err(ApiError::validation(
            "html",
            format!("exceeds the {} byte limit", config.max_html_bytes),
        ));
    }

    let defaults = default_dims(format);
    let width = req.viewport_width.or(req.width).unwrap_or(defaults.width);
    let height = req.viewport_height.or(req.height).unwrap_or(defaults.height);
    check_dimension("width", width, config.max_dimension)?;
    check_dimension("height", height, config.max_dimension)?;

    Ok(ValidatedRequest {
        html: req.html.clone(),
        dims: PageDimensions { width, height },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(html: &str) -> RenderRequest {
        RenderRequest {
            html: html.to_string(),
            width: None,
            height: None,
            viewport_width: None,
            viewport_height: None,
            certificate_data: None,
        }
    }

    fn config() -> Config {
        Config::default()
    }

    #[test]
    fn empty_html_is_rejected() {
        let err = validate(&request(""), &config(), OutputFormat::Pdf).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "html", .. }));
    }

    #[test]
    fn whitespace_only_html_is_rejected() {
        let err = validate(&request("   \n\t  "), &config(), OutputFormat::Png).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "html", .. }));
    }

    #[test]
    fn oversized_html_is_rejected() {
        let mut cfg = config();
        cfg.max_html_bytes = 16;
        let err = validate(
            &request("<p>this is longer than sixteen bytes</p>"),
            &cfg,
            OutputFormat::Pdf,
        )
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "html", .. }));
    }

    #[test]
    fn viewport_overrides_win() {
        let mut req = request("<p>Hi</p>");
        req.width = Some(100.0);
        req.height = Some(50.0);
        req.viewport_width = Some(800.0);
        req.viewport_height = Some(600.0);

        let validated = validate(&req, &config(), OutputFormat::Png).unwrap();
        assert_eq!(validated.dims.width, 800.0);
        assert_eq!(validated.dims.height, 600.0);
    }

    #[test]
    fn width_height_used_without_overrides() {
        let mut req = request("<p>Hi</p>");
        req.width = Some(100.0);
        req.height = Some(50.0);

        let validated = validate(&req, &config(), OutputFormat::Pdf).unwrap();
        assert_eq!(validated.dims.width, 100.0);
        assert_eq!(validated.dims.height, 50.0);
    }

    #[test]
    fn missing_dimensions_fall_back_to_format_defaults() {
        let pdf = validate(&request("<p>Hi</p>"), &config(), OutputFormat::Pdf).unwrap();
        assert_eq!(pdf.dims.width, 210.0);
        assert_eq!(pdf.dims.height, 297.0);

        let png = validate(&request("<p>Hi</p>"), &config(), OutputFormat::Png).unwrap();
        assert_eq!(png.dims.width, 1280.0);
        assert_eq!(png.dims.height, 720.0);
    }

    #[test]
    fn non_positive_dimensions_are_rejected() {
        let mut req = request("<p>Hi</p>");
        req.width = Some(0.0);
        req.height = Some(50.0);
        let err = validate(&req, &config(), OutputFormat::Pdf).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "width", .. }));

        let mut req = request("<p>Hi</p>");
        req.width = Some(100.0);
        req.height = Some(-3.0);
        let err = validate(&req, &config(), OutputFormat::Pdf).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "height", .. }));
    }

    #[test]
    fn dimensions_above_the_ceiling_are_rejected() {
        let mut req = request("<p>Hi</p>");
        req.viewport_width = Some(2001.0);
        let err = validate(&req, &config(), OutputFormat::Png).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "width", .. }));
    }

    #[test]
    fn non_finite_dimensions_are_rejected() {
        let mut req = request("<p>Hi</p>");
        req.width = Some(f64::NAN);
        let err = validate(&req, &config(), OutputFormat::Pdf).unwrap_err();
        assert!(matches!(err, ApiError::Validation { field: "width", .. }));
    }
}
