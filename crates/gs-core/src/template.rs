//! Local path templating for fetched files

use crate::endpoint::Endpoint;

/// Token replaced with the endpoint's alias, or its host when it has none
pub const HOST_TOKEN: &str = "{host}";

/// Token replaced with the endpoint's port
pub const PORT_TOKEN: &str = "{port}";

/// Render a local destination pattern for one endpoint
///
/// Every `{host}` and `{port}` occurrence is substituted, so one pattern
/// yields a distinct path per endpoint.
pub fn render_local_path(pattern: &str, endpoint: &Endpoint) -> String {
    pattern
        .replace(HOST_TOKEN, endpoint.display_name())
        .replace(PORT_TOKEN, &endpoint.port.to_string())
}

/// Whether a pattern contains any substitution token
pub fn is_templated(pattern: &str) -> bool {
    pattern.contains(HOST_TOKEN) || pattern.contains(PORT_TOKEN)
}
