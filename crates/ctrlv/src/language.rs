//! Language tags understood by the snippet service.
//!
//! The tag is what gets stored with a snippet; the syntax name is what the
//! highlighter looks up. Anything unknown is shown as plain text.

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    pub tag: &'static str,
    pub name: &'static str,
    pub extension: &'static str,
    /// syntect syntax name.
    pub syntax: &'static str,
}

pub const PLAIN_TEXT: Language = Language {
    tag: "plaintext",
    name: "Plain Text",
    extension: "txt",
    syntax: "Plain Text",
};

pub const LANGUAGES: &[Language] = &[
    Language {
        tag: "javascript",
        name: "JavaScript",
        extension: "js",
        syntax: "JavaScript",
    },
    Language {
        tag: "typescript",
        name: "TypeScript",
        extension: "ts",
        // No TypeScript grammar in the default set.
        syntax: "JavaScript",
    },
    Language {
        tag: "python",
        name: "Python",
        extension: "py",
        syntax: "Python",
    },
    Language {
        tag: "java",
        name: "Java",
        extension: "java",
        syntax: "Java",
    },
    Language {
        tag: "cpp",
        name: "C++",
        extension: "cpp",
        syntax: "C++",
    },
    Language {
        tag: "php",
        name: "PHP",
        extension: "php",
        syntax: "PHP",
    },
    Language {
        tag: "rust",
        name: "Rust",
        extension: "rs",
        syntax: "Rust",
    },
    Language {
        tag: "sql",
        name: "SQL",
        extension: "sql",
        syntax: "SQL",
    },
    Language {
        tag: "html",
        name: "HTML",
        extension: "html",
        syntax: "HTML",
    },
    Language {
        tag: "css",
        name: "CSS",
        extension: "css",
        syntax: "CSS",
    },
    Language {
        tag: "markdown",
        name: "Markdown",
        extension: "md",
        syntax: "Markdown",
    },
    Language {
        tag: "json",
        name: "JSON",
        extension: "json",
        syntax: "JSON",
    },
];

/// Look up a stored tag, falling back to plain text.
pub fn lookup(tag: &str) -> &'static Language {
    let tag = tag.trim().to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|lang| lang.tag == tag)
        .unwrap_or(&PLAIN_TEXT)
}

/// Guess a language from a file extension.
pub fn from_extension(ext: &str) -> Option<&'static Language> {
    let ext = ext.to_ascii_lowercase();
    let ext = match ext.as_str() {
        "mjs" | "cjs" | "jsx" => "js",
        "tsx" | "mts" | "cts" => "ts",
        "cc" | "cxx" | "hpp" | "hh" | "h" => "cpp",
        "htm" => "html",
        "markdown" => "md",
        other => other,
    };
    LANGUAGES.iter().find(|lang| lang.extension == ext)
}

/// Guess a language from a path, falling back to plain text.
pub fn from_path(path: &Path) -> &'static Language {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(from_extension)
        .unwrap_or(&PLAIN_TEXT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_falls_back_to_plain_text() {
        assert_eq!(lookup("rust").name, "Rust");
        assert_eq!(lookup("Python").name, "Python");
        assert_eq!(lookup("cobol"), &PLAIN_TEXT);
        assert_eq!(lookup("").name, "Plain Text");
    }

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(Path::new("src/main.rs")).tag, "rust");
        assert_eq!(from_path(Path::new("App.TSX")).tag, "typescript");
        assert_eq!(from_path(Path::new("notes")).tag, "plaintext");
        assert_eq!(from_path(Path::new("data.xyz")).tag, "plaintext");
    }
}
