use regex::{Captures, Regex};

/// A URL template with `{name}` placeholders, compiled to an anchored regular expression
/// plus the ordered list of parameter names.
///
/// Compilation happens once, when the matcher is built; the compiled form is reused for
/// every incoming request evaluated against that stub.
#[derive(Debug)]
pub(crate) struct UrlPattern {
    regex: Regex,
    params: Vec<String>,
}

impl UrlPattern {
    /// Compile `template` into an anchored regular expression.
    ///
    /// Literal `?`, `&` and `=` are escaped before placeholder substitution, so a
    /// template may embed a literal query string around its placeholders
    /// (e.g. `/api/users/{user_id}?attrs={attrs}`).
    pub(crate) fn compile(template: &str) -> Self {
        let escaped = template
            .replace('?', "\\?")
            .replace('&', "\\&")
            .replace('=', "\\=");

        // Identifies parameters like {param_name} within the template.
        let placeholder = Regex::new(r"\{(\w+)\}").expect("Failed to compile placeholder regex.");

        let mut params = Vec::new();
        let expression = placeholder.replace_all(&escaped, |caps: &Captures<'_>| {
            let name = caps[1].to_string();
            let group = format!("(?P<{}>[^/?&]+)", name);
            params.push(name);
            group
        });

        let regex = Regex::new(&format!("^{}$", expression))
            .unwrap_or_else(|e| panic!("Failed to compile URL pattern `{}`: {}", template, e));

        Self { regex, params }
    }

    /// Match `candidate` against the whole pattern, returning the captured parameters in
    /// template order on success.
    pub(crate) fn captures(&self, candidate: &str) -> Option<Vec<(String, String)>> {
        let caps = self.regex.captures(candidate)?;
        let mut captured = Vec::with_capacity(self.params.len());
        for name in &self.params {
            if let Some(value) = caps.name(name) {
                captured.push((name.clone(), value.as_str().to_string()));
            }
        }
        Some(captured)
    }
}
