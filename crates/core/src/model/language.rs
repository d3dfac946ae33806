use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Languages offered by the embedded code editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    Java,
    C,
    Cpp,
}

impl Language {
    pub const ALL: [Language; 4] = [Language::Python, Language::Java, Language::C, Language::Cpp];

    #[must_use]
    pub fn id(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::Java => "Java",
            Language::C => "C",
            Language::Cpp => "C++",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
        }
    }

    /// Starter source shown when a coding question has no template of its own.
    #[must_use]
    pub fn default_template(self) -> &'static str {
        match self {
            Language::Python => "# Write your Python code here\n",
            Language::Java => {
                "public class Main {\n    public static void main(String[] args) {\n        // Write your Java code here\n    }\n}\n"
            }
            Language::C => {
                "#include <stdio.h>\n\nint main() {\n    // Write your C code here\n    return 0;\n}\n"
            }
            Language::Cpp => {
                "#include <iostream>\n\nint main() {\n    // Write your C++ code here\n    return 0;\n}\n"
            }
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLanguage(pub String);

impl fmt::Display for UnknownLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown language: {}", self.0)
    }
}

impl std::error::Error for UnknownLanguage {}

impl FromStr for Language {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|lang| lang.id() == needle || lang.display_name().eq_ignore_ascii_case(&needle))
            .ok_or(UnknownLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ids_and_display_names() {
        assert_eq!("cpp".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" Python ".parse::<Language>().unwrap(), Language::Python);
        assert!("rust".parse::<Language>().is_err());
    }

    #[test]
    fn templates_mention_language() {
        for lang in Language::ALL {
            assert!(lang.default_template().contains(lang.display_name()));
        }
    }
}
