//! `discord_color`: hex or RGB text to Discord's decimal color.
//!
//! Pure computation; works on an unconfigured provider.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tfd_core::{DataSource, Diagnostics, ProviderError, ProviderResult};

use crate::{
    DiscordData,
    api::DiscordApi,
    codec::{ColorInput, MAX_COLOR},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorDataModel {
    #[serde(default)]
    pub hex: Option<String>,
    #[serde(default)]
    pub rgb: Option<String>,
    #[serde(default)]
    pub dec: Option<i64>,
}

/// Resolve a color model to its decimal value.
///
/// # Errors
///
/// Missing or conflicting inputs, or a value the converters reject.
pub fn resolve(model: &ColorDataModel) -> ProviderResult<u32> {
    let input = ColorInput::from_attributes(model.hex.as_deref(), model.rgb.as_deref())
        .map_err(|e| ProviderError::invalid(e.summary(), e.detail()))?;

    let value = input.to_decimal().map_err(|e| match input {
        ColorInput::Hex(_) => ProviderError::invalid("Invalid Hex Color", format!("Unable to parse hex color: {e}")),
        ColorInput::Rgb(_) => ProviderError::invalid("Invalid RGB Color", format!("Unable to parse RGB color: {e}")),
    })?;

    if value > MAX_COLOR {
        return Err(ProviderError::invalid(
            "Invalid Color Range",
            "Color value must be between 0 and 16777215 (0xFFFFFF).",
        ));
    }
    Ok(value)
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ColorDataSource;

#[async_trait]
impl DataSource<dyn DiscordApi> for ColorDataSource {
    type Model = ColorDataModel;

    fn type_name(&self) -> &'static str {
        "color"
    }

    async fn read(
        &self,
        _data: &DiscordData,
        config: ColorDataModel,
        _diags: &mut Diagnostics,
    ) -> ProviderResult<ColorDataModel> {
        let dec = resolve(&config)?;
        Ok(ColorDataModel {
            dec: Some(i64::from(dec)),
            ..config
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(hex: Option<&str>, rgb: Option<&str>) -> ColorDataModel {
        ColorDataModel {
            hex: hex.map(str::to_string),
            rgb: rgb.map(str::to_string),
            dec: None,
        }
    }

    #[tokio::test]
    async fn computes_decimal_without_a_client() {
        let mut diags = Diagnostics::new();
        let out = ColorDataSource
            .read(&DiscordData::unconfigured(), model(Some("#4287f5"), None), &mut diags)
            .await
            .unwrap();
        assert_eq!(out.dec, Some(4_360_181));
        assert_eq!(out.hex.as_deref(), Some("#4287f5"));
        assert!(diags.is_empty());
    }

    #[test]
    fn input_errors_name_the_form() {
        assert_eq!(resolve(&model(None, None)).unwrap_err().summary(), "Missing Color Input");
        assert_eq!(
            resolve(&model(Some("fff"), Some("rgb(1,2,3)"))).unwrap_err().summary(),
            "Conflicting Color Input"
        );
        assert_eq!(resolve(&model(Some("#ggg"), None)).unwrap_err().summary(), "Invalid Hex Color");
        let err = resolve(&model(None, Some("rgb(256, 0, 0)"))).unwrap_err();
        assert_eq!(err.summary(), "Invalid RGB Color");
        assert!(err.detail().starts_with("Unable to parse RGB color"));
    }

    #[test]
    fn empty_hex_falls_back_to_rgb() {
        assert_eq!(resolve(&model(Some(""), Some("rgb(66, 135, 245)"))).unwrap(), 4_360_181);
    }
}
