//! Extension to language-name table used for the language histogram

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Language reported for extensions missing from the table
pub const OTHER_LANGUAGE: &str = "Other";

static LANGUAGES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    [
        ("js", "JavaScript"),
        ("mjs", "JavaScript"),
        ("cjs", "JavaScript"),
        ("jsx", "JavaScript"),
        ("ts", "TypeScript"),
        ("tsx", "TypeScript"),
        ("py", "Python"),
        ("pyi", "Python"),
        ("java", "Java"),
        ("kt", "Kotlin"),
        ("kts", "Kotlin"),
        ("scala", "Scala"),
        ("groovy", "Groovy"),
        ("c", "C"),
        ("h", "C"),
        ("cpp", "C++"),
        ("cc", "C++"),
        ("cxx", "C++"),
        ("hpp", "C++"),
        ("hh", "C++"),
        ("cs", "C#"),
        ("fs", "F#"),
        ("go", "Go"),
        ("rs", "Rust"),
        ("rb", "Ruby"),
        ("php", "PHP"),
        ("swift", "Swift"),
        ("m", "Objective-C"),
        ("mm", "Objective-C"),
        ("dart", "Dart"),
        ("lua", "Lua"),
        ("pl", "Perl"),
        ("r", "R"),
        ("jl", "Julia"),
        ("hs", "Haskell"),
        ("ex", "Elixir"),
        ("exs", "Elixir"),
        ("erl", "Erlang"),
        ("clj", "Clojure"),
        ("elm", "Elm"),
        ("zig", "Zig"),
        ("nim", "Nim"),
        ("sh", "Shell"),
        ("bash", "Shell"),
        ("zsh", "Shell"),
        ("ps1", "PowerShell"),
        ("bat", "Batch"),
        ("sql", "SQL"),
        ("html", "HTML"),
        ("htm", "HTML"),
        ("css", "CSS"),
        ("scss", "SCSS"),
        ("sass", "Sass"),
        ("less", "Less"),
        ("vue", "Vue"),
        ("svelte", "Svelte"),
        ("json", "JSON"),
        ("yaml", "YAML"),
        ("yml", "YAML"),
        ("toml", "TOML"),
        ("xml", "XML"),
        ("ini", "INI"),
        ("md", "Markdown"),
        ("markdown", "Markdown"),
        ("rst", "reStructuredText"),
        ("txt", "Text"),
        ("proto", "Protocol Buffers"),
        ("graphql", "GraphQL"),
        ("tf", "HCL"),
        ("cmake", "CMake"),
        ("gradle", "Gradle"),
    ]
    .into_iter()
    .collect()
});

/// Language name for a lowercased extension, `"Other"` when unknown
pub fn language_for_extension(extension: Option<&str>) -> &'static str {
    extension
        .and_then(|ext| LANGUAGES.get(ext).copied())
        .unwrap_or(OTHER_LANGUAGE)
}
