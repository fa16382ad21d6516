//! Rewrites docs links that escape the docs directory into GitHub URLs.
//!
//! `[LICENSE](../LICENSE)` works when browsing the repository, but a static
//! site built from `docs/` cannot resolve it. Such links become
//! `{repo_url}/blob/{branch}/LICENSE`; links that stay inside the docs tree
//! are left alone. Code blocks, inline code and HTML comments are never touched.

use regex::{Captures, Regex};
use std::sync::OnceLock;

pub const DEFAULT_BRANCH: &str = "main";

const EXTENSIONLESS_FILES: &[&str] = &[
    "Containerfile",
    "Dockerfile",
    "Gemfile",
    "LICENSE",
    "Makefile",
    "Procfile",
    "Rakefile",
    "Taskfile",
    "Vagrantfile",
];

const PLACEHOLDER_OPEN: char = '\u{E000}';
const PLACEHOLDER_CLOSE: char = '\u{E001}';

fn inline_link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(!?)\[([^\]]*)\]\((\.\./[^)]*)\)").expect("static regex"))
}

fn href_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"href="(\.\./[^"]*)"|href='(\.\./[^']*)'"#).expect("static regex")
    })
}

fn reference_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^( {0,3}\[[^\]]+\]:[ \t]*)(\.\./\S+)").expect("static regex")
    })
}

fn html_comment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->").expect("static regex"))
}

fn inline_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"`[^`\n]+`").expect("static regex"))
}

/// Masked regions, restored after rewriting.
///
/// Placeholders carry a prefix that does not occur in the page, so text
/// that happens to contain the private-use markers is never mistaken for one.
#[derive(Debug)]
struct Protected {
    prefix: String,
    stash: Vec<String>,
}

impl Protected {
    fn new(markdown: &str) -> Self {
        let prefix = (0usize..)
            .map(|k| format!("{}{}:", PLACEHOLDER_OPEN, k))
            .find(|prefix| !markdown.contains(prefix.as_str()))
            .unwrap_or_default();
        Self {
            prefix,
            stash: Vec::new(),
        }
    }

    fn placeholder(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, index, PLACEHOLDER_CLOSE)
    }

    fn hold(&mut self, text: &str) -> String {
        self.stash.push(text.to_string());
        self.placeholder(self.stash.len() - 1)
    }

    fn mask_fences(&mut self, markdown: &str) -> String {
        let mut out = String::with_capacity(markdown.len());
        let mut block = String::new();
        let mut fence: Option<&str> = None;

        for line in markdown.split_inclusive('\n') {
            let trimmed = line.trim_start();
            match fence {
                None => {
                    if let Some(marker) = ["```", "~~~"].into_iter().find(|m| trimmed.starts_with(m)) {
                        fence = Some(marker);
                        block.push_str(line);
                    } else {
                        out.push_str(line);
                    }
                }
                Some(marker) => {
                    block.push_str(line);
                    if trimmed.starts_with(marker) {
                        let masked = self.hold(&block);
                        out.push_str(&masked);
                        block.clear();
                        fence = None;
                    }
                }
            }
        }
        // Unclosed fence runs to the end of the document.
        if !block.is_empty() {
            let masked = self.hold(&block);
            out.push_str(&masked);
        }
        out
    }

    fn mask(&mut self, markdown: &str) -> String {
        let fenced = self.mask_fences(markdown);
        let commented = html_comment_regex()
            .replace_all(&fenced, |c: &Captures| self.hold(&c[0]))
            .into_owned();
        inline_code_regex()
            .replace_all(&commented, |c: &Captures| self.hold(&c[0]))
            .into_owned()
    }

    /// A held region only contains placeholders of earlier holds, so a
    /// single pass from the last hold back to the first restores everything.
    fn restore(&self, text: &str) -> String {
        let mut current = text.to_string();
        for (index, held) in self.stash.iter().enumerate().rev() {
            current = current.replacen(&self.placeholder(index), held, 1);
        }
        current
    }
}

/// Lexical `normpath`: resolves `.` and `..` without touching the filesystem.
pub fn normalize(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }
    if parts.is_empty() {
        ".".to_string()
    } else {
        parts.join("/")
    }
}

/// `target` split into path, `?query` and `#fragment` (each suffix keeps its marker).
pub fn split_target(target: &str) -> (&str, &str, &str) {
    if let Some(q) = target.find('?') {
        let (path, rest) = target.split_at(q);
        match rest.find('#') {
            Some(h) => (path, &rest[..h], &rest[h..]),
            None => (path, rest, ""),
        }
    } else if let Some(h) = target.find('#') {
        let (path, fragment) = target.split_at(h);
        (path, "", fragment)
    } else {
        (target, "", "")
    }
}

pub fn is_likely_file(path: &str) -> bool {
    let basename = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    basename.contains('.') || EXTENSIONLESS_FILES.contains(&basename)
}

pub fn build_github_url(repo_url: &str, repo_path: &str, suffix: &str, branch: &str) -> String {
    let clean = repo_path.trim_end_matches('/');
    let kind = if is_likely_file(clean) { "blob" } else { "tree" };
    if clean.is_empty() {
        format!("{}/{}/{}{}", repo_url, kind, branch, suffix)
    } else {
        format!("{}/{}/{}/{}{}", repo_url, kind, branch, clean, suffix)
    }
}

/// Rewrites repo-relative links of one page.
#[derive(Debug, Clone)]
pub struct LinkRewriter {
    repo_url: String,
    branch: String,
}

impl LinkRewriter {
    pub fn new(repo_url: &str, branch: &str) -> Self {
        Self {
            repo_url: repo_url.trim_end_matches('/').to_string(),
            branch: branch.to_string(),
        }
    }

    /// GitHub URL for `target` as written on the page at `page_dir`, if it escapes the docs tree.
    pub fn resolve(&self, page_dir: &str, target: &str) -> Option<String> {
        let (path, query, fragment) = split_target(target);
        let joined = if page_dir.is_empty() {
            path.to_string()
        } else {
            format!("{}/{}", page_dir, path)
        };
        let resolved = normalize(&joined);
        if !resolved.starts_with("..") {
            return None;
        }

        let repo_path = resolved
            .split('/')
            .skip_while(|s| *s == "..")
            .collect::<Vec<_>>()
            .join("/");
        Some(build_github_url(
            &self.repo_url,
            &repo_path,
            &format!("{}{}", query, fragment),
            &self.branch,
        ))
    }

    /// `page_src_path` is relative to the docs dir (`guide/setup.md`).
    pub fn rewrite(&self, markdown: &str, page_src_path: &str) -> (String, usize) {
        if self.repo_url.is_empty() {
            return (markdown.to_string(), 0);
        }
        let page_dir = page_src_path.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
        let mut count = 0usize;

        let mut protected = Protected::new(markdown);
        let masked = protected.mask(markdown);

        let step = inline_link_regex().replace_all(&masked, |c: &Captures| {
            if &c[1] == "!" {
                return c[0].to_string();
            }
            match self.resolve(page_dir, &c[3]) {
                Some(url) => {
                    count += 1;
                    tracing::debug!("{}: {} -> {}", page_src_path, &c[3], url);
                    format!("[{}]({})", &c[2], url)
                }
                None => c[0].to_string(),
            }
        });

        let step = href_regex().replace_all(&step, |c: &Captures| {
            let (quote, target) = match (c.get(1), c.get(2)) {
                (Some(t), _) => ('"', t.as_str()),
                (None, Some(t)) => ('\'', t.as_str()),
                (None, None) => return c[0].to_string(),
            };
            match self.resolve(page_dir, target) {
                Some(url) => {
                    count += 1;
                    format!("href={}{}{}", quote, url, quote)
                }
                None => c[0].to_string(),
            }
        });

        let step = reference_regex().replace_all(&step, |c: &Captures| match self.resolve(page_dir, &c[2]) {
            Some(url) => {
                count += 1;
                format!("{}{}", &c[1], url)
            }
            None => c[0].to_string(),
        });

        let result = protected.restore(&step);
        if count > 0 {
            tracing::debug!("{}: rewrote {} link(s)", page_src_path, count);
        }
        (result, count)
    }
}

/// Convenience wrapper over [`LinkRewriter`].
pub fn rewrite_repo_links(markdown: &str, page_src_path: &str, repo_url: &str, branch: &str) -> (String, usize) {
    LinkRewriter::new(repo_url, branch).rewrite(markdown, page_src_path)
}
