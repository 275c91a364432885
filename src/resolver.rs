//! Identifier resolution.
//!
//! Maps an identifier tuple onto the backend endpoint that can locate the
//! requested file. Precedence is instrument+experiment, then user number, then
//! experiment number alone.

use crate::models::IdentifierTuple;
use urlencoding::encode;

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Build the lookup URL for `ids`, or `None` if no usable combination exists.
pub fn resolve_lookup_url(api_url: &str, ids: &IdentifierTuple) -> Option<String> {
    let api_url = api_url.trim_end_matches('/');

    if let (Some(instrument), Some(experiment)) =
        (present(&ids.instrument), present(&ids.experiment_number))
    {
        return Some(format!(
            "{}/find_file/instrument/{}/experiment_number/{}",
            api_url,
            encode(instrument),
            encode(experiment)
        ));
    }
    if let Some(user) = present(&ids.user_number) {
        return Some(format!(
            "{}/find_file/generic/user_number/{}",
            api_url,
            encode(user)
        ));
    }
    if let Some(experiment) = present(&ids.experiment_number) {
        return Some(format!(
            "{}/find_file/generic/experiment_number/{}",
            api_url,
            encode(experiment)
        ));
    }
    None
}

/// Endpoint serving raw text content. Only instrument experiments have one.
pub fn text_content_url(api_url: &str, ids: &IdentifierTuple) -> Option<String> {
    let instrument = present(&ids.instrument)?;
    let experiment = present(&ids.experiment_number)?;
    Some(format!(
        "{}/text/instrument/{}/experiment_number/{}",
        api_url.trim_end_matches('/'),
        encode(instrument),
        encode(experiment)
    ))
}
