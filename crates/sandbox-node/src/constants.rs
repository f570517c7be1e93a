pub(crate) const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub(crate) const DEFAULT_MAX_SESSIONS: usize = 64;
pub(crate) const DOT_CONTENT_TYPE: &str = "text/vnd.graphviz; charset=utf-8";
