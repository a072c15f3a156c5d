//! qmljs_path: Path normalization for documents, directories and modules.
//!
//! Paths are handled as `/`-separated strings. Documents are keyed by their
//! cleaned path, so every path that enters a snapshot or an import goes
//! through [`clean_path`].

/// Kinds of source files the analysis understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Qml,
    JavaScript,
    /// `qmldir` module definition files.
    QmlDir,
}

impl SourceKind {
    /// Classify a path by its extension.
    pub fn from_path(path: &str) -> Option<SourceKind> {
        let name = base_name(path);
        if name == "qmldir" {
            return Some(SourceKind::QmlDir);
        }
        let lower = name.to_lowercase();
        if lower.ends_with(".qml") || lower.ends_with(".ui.qml") {
            Some(SourceKind::Qml)
        } else if lower.ends_with(".js") || lower.ends_with(".mjs") {
            Some(SourceKind::JavaScript)
        } else {
            None
        }
    }
}

/// Convert backslashes to forward slashes.
pub fn normalize_slashes(path: &str) -> String {
    path.replace('\\', "/")
}

/// Check if a path is rooted (absolute).
pub fn is_rooted(path: &str) -> bool {
    let bytes = path.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    if bytes[0] == b'/' || bytes[0] == b'\\' {
        return true;
    }
    // Windows drive letter
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && (bytes[2] == b'/' || bytes[2] == b'\\')
}

/// Remove `.` segments, fold `..` into their parent and collapse repeated
/// separators. A trailing separator is dropped (except for the root).
///
/// `..` segments that climb above a relative path's start are kept; above
/// an absolute root they are discarded.
pub fn clean_path(path: &str) -> String {
    let path = normalize_slashes(path);
    let rooted = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if rooted => {}
                _ => segments.push(".."),
            },
            _ => segments.push(segment),
        }
    }
    let joined = segments.join("/");
    if rooted {
        format!("/{}", joined)
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join `relative` onto `base` and clean the result. A rooted `relative`
/// replaces the base.
pub fn combine_paths(base: &str, relative: &str) -> String {
    if is_rooted(relative) || base.is_empty() {
        return clean_path(relative);
    }
    clean_path(&format!("{}/{}", base, relative))
}

/// The directory part of a path, without a trailing separator.
/// Returns `.` for a bare file name.
pub fn directory_of(path: &str) -> String {
    let normalized = normalize_slashes(path);
    match normalized.rfind('/') {
        Some(0) => "/".to_string(),
        Some(idx) => normalized[..idx].to_string(),
        None => ".".to_string(),
    }
}

/// The last path segment.
pub fn base_name(path: &str) -> &str {
    match path.rfind(|c| c == '/' || c == '\\') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// The QML component name a file declares: its base name up to the first
/// `.`, so `Button.ui.qml` declares `Button`.
pub fn component_name(path: &str) -> &str {
    let name = base_name(path);
    match name.find('.') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Whether a directory import or qmldir entry names a JavaScript file.
pub fn is_js_file(path: &str) -> bool {
    SourceKind::from_path(path) == Some(SourceKind::JavaScript)
}

/// `QtQuick.Controls` -> `QtQuick/Controls`.
pub fn module_uri_to_path(uri: &str) -> String {
    uri.replace('.', "/")
}

/// Candidate directories for a module import, most specific first:
/// `<base>/<uri>.<major>.<minor>`, `<base>/<uri>.<major>`, `<base>/<uri>`.
pub fn module_directory_candidates(
    import_path: &str,
    uri: &str,
    major: i32,
    minor: i32,
) -> Vec<String> {
    let relative = module_uri_to_path(uri);
    let mut candidates = Vec::with_capacity(3);
    if major >= 0 {
        if minor >= 0 {
            candidates.push(combine_paths(
                import_path,
                &format!("{}.{}.{}", relative, major, minor),
            ));
        }
        candidates.push(combine_paths(import_path, &format!("{}.{}", relative, major)));
    }
    candidates.push(combine_paths(import_path, &relative));
    candidates
}
