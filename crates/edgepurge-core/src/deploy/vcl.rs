// # CORS VCL Renderer
//
// Renders the CORS edge module configuration into a deliver-phase VCL
// snippet: the same header logic the serving-path composer applies,
// expressed in the CDN's configuration language so cache hits get CORS
// headers without touching origin.

use regex::Regex;

use crate::config::{CorsModuleConfig, OriginMode};
use crate::error::{Error, Result};
use crate::traits::SnippetRenderer;

/// Default renderer producing a deliver-phase VCL snippet
#[derive(Debug, Clone, Copy, Default)]
pub struct CorsVclRenderer;

impl CorsVclRenderer {
    /// Create a renderer
    pub fn new() -> Self {
        Self
    }
}

impl SnippetRenderer for CorsVclRenderer {
    fn render(&self, module: &CorsModuleConfig) -> Result<String> {
        let origin_condition;
        let allow_origin_value;

        match module.origin_mode {
            OriginMode::Anyone => {
                origin_condition = "req.http.Origin".to_string();
                allow_origin_value = "\"*\"".to_string();
            }
            OriginMode::Regex => {
                let pattern = module.allowed_origins_regex.trim();
                if pattern.is_empty() {
                    return Err(Error::snippet_render(
                        "origin_mode is \"regex\" but allowed_origins_regex is empty",
                    ));
                }
                // The pattern must at least be a valid regex before it is
                // embedded into the snippet
                let full = format!("^https?://{}", pattern);
                Regex::new(&full).map_err(|e| {
                    Error::snippet_render(format!(
                        "invalid allowed_origins_regex {:?}: {}",
                        pattern, e
                    ))
                })?;
                origin_condition = format!("req.http.Origin ~ {}", vcl_string(&full));
                allow_origin_value = "req.http.Origin".to_string();
            }
        }

        let mut body = String::new();
        body.push_str(&format!(
            "  set resp.http.Access-Control-Allow-Origin = {};\n",
            allow_origin_value
        ));
        if !module.allowed_methods.is_empty() {
            body.push_str(&format!(
                "  set resp.http.Access-Control-Allow-Methods = {};\n",
                vcl_string(&module.allowed_methods)
            ));
        }
        if !module.allowed_headers.is_empty() {
            body.push_str(&format!(
                "  set resp.http.Access-Control-Allow-Headers = {};\n",
                vcl_string(&module.allowed_headers)
            ));
        }
        body.push_str("  set resp.http.Vary:Origin = \"\";\n");

        Ok(format!(
            "if ({} && !resp.http.Access-Control-Allow-Origin) {{\n{}}}\n",
            origin_condition, body
        ))
    }
}

/// Quote a string as a VCL string literal
fn vcl_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}
