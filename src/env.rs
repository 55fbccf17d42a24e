use std::collections::BTreeMap;
use std::path::Path;

/// Variable lookup that consults a parsed `.env` file before the process
/// environment. Blank values are treated as unset.
#[derive(Clone, Default)]
pub struct Env {
    pub dotenv: BTreeMap<String, String>,
}

impl std::fmt::Debug for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keys: Vec<&str> = self.dotenv.keys().map(String::as_str).collect();
        f.debug_struct("Env").field("dotenv_keys", &keys).finish()
    }
}

impl Env {
    pub fn from_process() -> Self {
        Self::default()
    }

    pub fn parse_dotenv(contents: &str) -> Self {
        Self {
            dotenv: parse_dotenv(contents),
        }
    }

    pub fn load_dotenv(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Self::parse_dotenv(&contents))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.dotenv.get(key) {
            return Some(value.clone());
        }
        std::env::var(key)
            .ok()
            .filter(|value| !value.trim().is_empty())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// Parses `KEY=value` lines, accepting an optional `export ` prefix and
/// single or double quotes around the value.
pub fn parse_dotenv(contents: &str) -> BTreeMap<String, String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            let value = unquote(value.trim());
            if key.is_empty() || value.trim().is_empty() {
                return None;
            }
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    ['"', '\'']
        .iter()
        .find_map(|quote| {
            value
                .strip_prefix(*quote)
                .and_then(|rest| rest.strip_suffix(*quote))
        })
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_dotenv_handles_export_quotes_and_comments() {
        let parsed = parse_dotenv(
            "# builtin models\nexport BUILTIN_MODEL_API_KEY=\"sk-test\"\nBUILTIN_MODEL_ACCESS_KEY='abc, def'\n\nEMPTY=\nBROKEN LINE\n",
        );
        assert_eq!(parsed.len(), 2);
        assert_eq!(
            parsed.get("BUILTIN_MODEL_API_KEY").map(String::as_str),
            Some("sk-test")
        );
        assert_eq!(
            parsed.get("BUILTIN_MODEL_ACCESS_KEY").map(String::as_str),
            Some("abc, def")
        );
    }

    #[test]
    fn dotenv_values_take_precedence_and_debug_hides_values() {
        let env = Env::parse_dotenv("BMG_TEST_ONLY_DOTENV_KEY=from-dotenv\n");
        assert_eq!(
            env.get("BMG_TEST_ONLY_DOTENV_KEY").as_deref(),
            Some("from-dotenv")
        );
        assert_eq!(env.get_or("BMG_TEST_ONLY_MISSING_KEY", "fallback"), "fallback");

        let debug = format!("{env:?}");
        assert!(debug.contains("BMG_TEST_ONLY_DOTENV_KEY"));
        assert!(!debug.contains("from-dotenv"));
    }

    #[test]
    fn load_dotenv_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".env");
        std::fs::write(&path, "BUILTIN_MODEL_ENABLED=false\n").expect("write");
        let env = Env::load_dotenv(&path).expect("load");
        assert_eq!(env.get("BUILTIN_MODEL_ENABLED").as_deref(), Some("false"));
    }
}
