/// Target languages the sandbox can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    Python,
    JavaScript,
    Cpp,
    Java,
}

impl Language {
    /// Parse a caller-declared language name, accepting common aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "python" | "python3" | "py" => Some(Language::Python),
            "javascript" | "js" | "node" | "nodejs" => Some(Language::JavaScript),
            "c++" | "cpp" | "cxx" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Cpp => "c++",
            Language::Java => "java",
        }
    }

    pub fn source_extension(&self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Cpp => "cpp",
            Language::Java => "java",
        }
    }

    /// Whether the language runs through an interpreter (no compile phase).
    pub fn is_interpreted(&self) -> bool {
        matches!(self, Language::Python | Language::JavaScript)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Query-language dialects accepted by the hardening gate. Anything outside
/// this list fails the gate before any execution is considered.
const QUERY_DIALECTS: &[&str] = &[
    "sql",
    "mysql",
    "mariadb",
    "postgres",
    "postgresql",
    "sqlite",
    "mssql",
    "tsql",
    "t-sql",
    "plsql",
    "pl/sql",
];

pub fn is_query_dialect(name: &str) -> bool {
    let normalized = name.trim().to_ascii_lowercase();
    QUERY_DIALECTS.contains(&normalized.as_str())
}

/// Scan Java source for the class the file must be named after.
///
/// Java requires a public top-level class to live in a file named
/// `<ClassName>.java`. Prefers `public class`, falls back to the first
/// `class` declaration, then to `None` if the text declares no class.
pub fn java_main_class(source: &str) -> Option<String> {
    let mut fallback = None;

    for line in source.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("//") || trimmed.starts_with('*') {
            continue;
        }

        if let Some(name) = class_name_after(trimmed, "public class ") {
            return Some(name);
        }
        if fallback.is_none() {
            if let Some(name) = class_name_after(trimmed, "class ") {
                fallback = Some(name);
            }
        }
    }

    fallback
}

fn class_name_after(line: &str, keyword: &str) -> Option<String> {
    let rest = line.strip_prefix(keyword)?;
    let name: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '$')
        .collect();
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}
