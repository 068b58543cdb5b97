//! Offline response synthesized when neither network nor store can answer a
//! navigation.

use swcache_core::ResponseSnapshot;

pub const OFFLINE_HTML: &str = "<!DOCTYPE html>
<html lang=\"en\">
<head>
<meta charset=\"utf-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
<title>Offline</title>
</head>
<body>
<h1>You are offline</h1>
<p>This page is not available without a network connection. Check your connection and try again.</p>
</body>
</html>
";

/// Build the offline page for a navigation to `url`.
///
/// The status is 200 so the browser renders the body instead of its own
/// network error page.
pub fn offline_response(url: &str) -> ResponseSnapshot {
    ResponseSnapshot::new(url, 200, OFFLINE_HTML)
        .with_header("Content-Type", "text/html; charset=utf-8")
        .with_header("Cache-Control", "no-store")
}
