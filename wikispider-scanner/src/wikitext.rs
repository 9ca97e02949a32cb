//! Lightweight scanners over raw wikitext: titles, redirects, links, infobox
//! kinds and link ranking. None of these understand templates.

use std::collections::{HashMap, HashSet};
use url::form_urlencoded;

const REDIRECT_MARKER: &str = "#REDIRECT";
const INFOBOX_MARKER: &str = "{{Infobox";
const PERSONDATA_MARKER: &str = "{{Persondata";

/// Longest link target, in characters, that `extract_links` accepts.
pub const MAX_LINK_LEN: usize = 64;

/// Infobox labels this long (in bytes) or longer are treated as garbage.
const MAX_KIND_LEN: usize = 32;

/// Query-string escaping of a title, used for cache file names, request URLs
/// and the graph file. `~` stays literal and `*` is escaped, so names match
/// caches written by other MediaWiki tooling.
pub fn escape_title(title: &str) -> String {
    let escaped: String = form_urlencoded::byte_serialize(title.as_bytes()).collect();
    // a literal '%' is always written as "%25", so "%7E" can only be '~'
    escaped.replace('*', "%2A").replace("%7E", "~")
}

/// Canonical spelling of a title: every word capitalised, spaces turned into
/// underscores, `_Of_` lowered back, and any `#fragment` dropped.
pub fn normalize_title(title: &str) -> String {
    let mut normalized = String::with_capacity(title.len());
    let mut capitalize = true;
    for c in title.chars() {
        if c == ' ' {
            normalized.push('_');
            capitalize = true;
        } else if capitalize {
            normalized.extend(c.to_uppercase());
            capitalize = false;
        } else {
            normalized.push(c);
        }
    }

    normalized = normalized.replace("_Of_", "_of_");
    if let Some(fragment) = normalized.find('#') {
        normalized.truncate(fragment);
    }
    normalized
}

/// Target of a `#REDIRECT [[Target#Section]]` directive, without the section.
pub fn redirect_target(body: &str) -> Option<String> {
    let marker = body.find(REDIRECT_MARKER)?;
    let rest = &body[marker + REDIRECT_MARKER.len()..];
    let open = rest.find("[[")?;
    let inner = &rest[open + 2..];
    let close = inner.find("]]")?;
    let target = inner[..close].split('#').next().unwrap_or_default().trim();

    if target.is_empty() {
        None
    } else {
        Some(target.to_string())
    }
}

/// All `[[Target]]` and `[[Target|display]]` links in document order.
///
/// Candidates containing a namespace colon or a newline, longer than
/// [`MAX_LINK_LEN`] characters, or never closed are skipped. Duplicates are
/// kept.
pub fn extract_links(body: &str) -> Vec<String> {
    let mut links = Vec::with_capacity(32);
    let mut cursor = 0;

    while let Some(offset) = body[cursor..].find("[[") {
        let opener = cursor + offset;
        if let Some(link) = scan_link(&body[opener + 2..]) {
            links.push(link.to_string());
        }
        cursor = opener + 1;
    }

    links
}

fn scan_link(rest: &str) -> Option<&str> {
    for (count, (idx, c)) in rest.char_indices().enumerate() {
        match c {
            '|' => return non_empty(&rest[..idx]),
            ']' if rest[idx..].starts_with("]]") => return non_empty(&rest[..idx]),
            ':' | '\n' => return None,
            _ if count >= MAX_LINK_LEN => return None,
            _ => {}
        }
    }
    None
}

fn non_empty(span: &str) -> Option<&str> {
    if span.is_empty() { None } else { Some(span) }
}

/// Lowercase infobox labels in the body, plus `person` for Persondata.
pub fn infobox_kinds(body: &str) -> Vec<String> {
    let mut kinds = Vec::new();

    if body.contains(PERSONDATA_MARKER) {
        kinds.push("person".to_string());
    }

    let mut rest = body;
    while let Some(idx) = rest.find(INFOBOX_MARKER) {
        rest = &rest[idx + INFOBOX_MARKER.len()..];
        // the separator between "Infobox" and the label
        let mut chars = rest.chars();
        if chars.next().is_none() {
            break;
        }
        rest = chars.as_str();

        let Some(end) = rest.find(['<', '|', '\n']) else {
            continue;
        };
        if end >= MAX_KIND_LEN {
            continue;
        }
        let kind = rest[..end].trim_matches(' ').to_lowercase();
        if !kind.is_empty() {
            kinds.push(kind);
        }
    }

    kinds
}

/// Rank `links` by how often each appears as a bare alphabetic token in
/// `text`, most frequent first, keeping at most `n` (all when `None`).
///
/// Lookups are exact string matches, so multi-word or differently-cased
/// titles score zero. Ties keep their first-seen order.
pub fn most_common(text: &str, links: &[String], n: Option<usize>) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::with_capacity(128);
    for token in text.split(|c: char| !c.is_alphabetic()) {
        if !token.is_empty() {
            *counts.entry(token).or_default() += 1;
        }
    }

    let mut seen = HashSet::with_capacity(links.len());
    let mut tally: Vec<(&String, usize)> = links
        .iter()
        .filter(|link| seen.insert(link.as_str()))
        .map(|link| (link, counts.get(link.as_str()).copied().unwrap_or(0)))
        .collect();

    tally.sort_by(|a, b| b.1.cmp(&a.1));

    let take = n.unwrap_or(tally.len()).min(tally.len());
    tally
        .into_iter()
        .take(take)
        .map(|(link, _)| link.clone())
        .collect()
}
