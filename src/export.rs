//! Document export
//!
//! Markdown exports are the raw content plus a footer banner. HTML runs the
//! content (markers replaced by headings) through pulldown-cmark inside a
//! fixed stylesheet template. PDF prints the HTML with a headless Chromium;
//! the child process is spawned with kill_on_drop and awaited under a
//! timeout so it cannot leak. Bulk export streams a ZIP, skipping pages
//! that fail rather than aborting the archive.

use std::io::{Cursor, Write};
use std::time::Duration;

use pulldown_cmark::{html, Options, Parser};
use zip::write::FileOptions;
use zip::ZipWriter;

use crate::config::Config;
use crate::models::WikiPage;
use crate::sections;

const HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
  body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif;
         max-width: 800px; margin: 2rem auto; padding: 0 1rem;
         color: #1a202c; line-height: 1.6; }
  h1, h2, h3 { line-height: 1.25; }
  pre { background: #f7fafc; padding: 1rem; overflow-x: auto;
        border-radius: 4px; }
  code { font-family: "SF Mono", Consolas, monospace; font-size: 0.9em; }
  blockquote { border-left: 4px solid #cbd5e0; margin-left: 0;
               padding-left: 1rem; color: #4a5568; }
  table { border-collapse: collapse; }
  th, td { border: 1px solid #cbd5e0; padding: 0.4rem 0.8rem; }
  .export-footer { margin-top: 3rem; padding-top: 1rem;
                   border-top: 1px solid #e2e8f0; color: #718096;
                   font-size: 0.85em; }
</style>
</head>
<body>
<h1>{title}</h1>
{content}
<div class="export-footer">{footer}</div>
</body>
</html>
"#;

fn footer_banner(page: &WikiPage) -> String {
    format!(
        "Exported from the wiki \u{2014} page \"{}\", last updated {}",
        page.title, page.updated_at
    )
}

/// Raw markdown plus a footer banner
pub fn export_markdown(page: &WikiPage) -> String {
    format!("{}\n\n---\n\n*{}*\n", page.content, footer_banner(page))
}

/// Convert markdown to an HTML fragment
pub fn render_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::all());
    let mut out = String::new();
    html::push_html(&mut out, parser);
    out
}

/// Full HTML document for a page, section markers replaced by headings
pub fn export_html(page: &WikiPage) -> String {
    let body = render_html(&sections::strip_markers(&page.content));

    HTML_TEMPLATE
        .replace("{title}", &page.title)
        .replace("{content}", &body)
        .replace("{footer}", &footer_banner(page))
}

/// Print a page to PDF via headless Chromium (A4, default margins).
pub async fn export_pdf(config: &Config, page: &WikiPage) -> anyhow::Result<Vec<u8>> {
    let html = export_html(page);

    let workdir = tempfile::tempdir()?;
    let html_path = workdir.path().join("page.html");
    let pdf_path = workdir.path().join("page.pdf");
    std::fs::write(&html_path, html)?;

    let mut child = tokio::process::Command::new(&config.chromium_path)
        .arg("--headless")
        .arg("--disable-gpu")
        .arg("--no-sandbox")
        .arg("--no-pdf-header-footer")
        .arg(format!("--print-to-pdf={}", pdf_path.display()))
        .arg(format!("file://{}", html_path.display()))
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .kill_on_drop(true)
        .spawn()?;

    let status = tokio::time::timeout(
        Duration::from_secs(config.pdf_timeout_secs),
        child.wait(),
    )
    .await;

    match status {
        Ok(Ok(status)) if status.success() => {}
        Ok(Ok(status)) => anyhow::bail!("chromium exited with {}", status),
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            // Timed out; dropping the child kills it
            child.kill().await.ok();
            anyhow::bail!("PDF render timed out after {}s", config.pdf_timeout_secs);
        }
    }

    Ok(std::fs::read(&pdf_path)?)
}

/// Build a ZIP archive of the given pages in the requested format.
/// A page that fails to export is logged and skipped.
pub async fn export_bulk(
    config: &Config,
    pages: &[WikiPage],
    format: &str,
) -> anyhow::Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default();
    let mut added = 0usize;

    for page in pages {
        let (filename, bytes) = match format {
            "markdown" => (
                format!("{}.md", safe_filename(&page.title)),
                export_markdown(page).into_bytes(),
            ),
            "html" => (
                format!("{}.html", safe_filename(&page.title)),
                export_html(page).into_bytes(),
            ),
            "pdf" => match export_pdf(config, page).await {
                Ok(bytes) => (format!("{}.pdf", safe_filename(&page.title)), bytes),
                Err(e) => {
                    tracing::warn!("skipping page '{}' in bulk export: {:#}", page.title, e);
                    continue;
                }
            },
            other => anyhow::bail!("unsupported export format: {}", other),
        };

        zip.start_file(filename, options)?;
        zip.write_all(&bytes)?;
        added += 1;
    }

    if added == 0 {
        anyhow::bail!("no pages could be exported");
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Turn a page title into a safe archive member name
pub fn safe_filename(title: &str) -> String {
    let name: String = title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let name = name.trim().replace(' ', "_");
    if name.is_empty() {
        "page".to_string()
    } else {
        name
    }
}
