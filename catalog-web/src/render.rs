//! Server-side HTML for the catalog pages
//!
//! Every value taken from the catalog or the request goes through [`escape`].

use crate::books::{BookPage, SearchMode, SearchResults};
use catalog_common::Work;

/// Escape text for HTML element content and quoted attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <style>
        body {{
            font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
            background: #1a1a1a;
            color: #e0e0e0;
            margin: 0;
        }}
        header {{
            background-color: #2a2a2a;
            border-bottom: 1px solid #3a3a3a;
            padding: 16px 20px;
        }}
        header a {{ color: #4a9eff; font-size: 22px; text-decoration: none; }}
        main {{ max-width: 1000px; margin: 0 auto; padding: 20px; }}
        a {{ color: #4a9eff; }}
        form input[type=text] {{ width: 60%; padding: 6px; }}
        .book {{ display: flex; gap: 12px; padding: 10px 0; border-bottom: 1px solid #333; }}
        .book img {{ width: 60px; }}
        .meta {{ color: #888; font-size: 14px; }}
        .pager {{ display: flex; gap: 16px; margin-top: 16px; }}
        .message {{ padding: 20px; background: #2a2a2a; border-left: 4px solid #ff6b6b; }}
        dl {{ display: grid; grid-template-columns: 140px 1fr; gap: 6px; }}
        dt {{ color: #888; }}
    </style>
</head>
<body>
    <header><a href="/">Book Catalog</a></header>
    <main>
{body}
    </main>
</body>
</html>
"#,
        title = escape(title),
        body = body,
    )
}

fn search_form(query: &str) -> String {
    format!(
        r#"<form action="/search/" method="get">
    <input type="text" name="q" value="{}" placeholder="Title, author or publisher">
    <button type="submit">Search</button>
</form>"#,
        escape(query)
    )
}

fn format_rating(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1}"),
        None => "unrated".to_string(),
    }
}

/// Link to another page of the same listing. The query is kept when present.
pub fn page_link(base: &str, query: Option<&str>, page: i64) -> String {
    match query {
        Some(q) => format!("{base}?q={}&page={page}", urlencoding::encode(q)),
        None => format!("{base}?page={page}"),
    }
}

fn book_item(work: &Work) -> String {
    let thumb = work
        .thumbnail_url()
        .map(|url| format!(r#"<img src="{}" alt="">"#, escape(url)))
        .unwrap_or_default();

    let mut meta = Vec::new();
    if let Some(authors) = &work.authors {
        meta.push(escape(authors));
    }
    if let Some(year) = &work.year {
        meta.push(escape(year));
    }
    if let Some(publisher) = &work.publisher {
        meta.push(escape(publisher));
    }

    format!(
        r#"<div class="book">
    {thumb}
    <div>
        <a href="/book/{id}/">{title}</a>
        <div class="meta">{meta}</div>
        <div class="meta">Rating: {rating}</div>
    </div>
</div>"#,
        thumb = thumb,
        id = work.id,
        title = escape(&work.title),
        meta = meta.join(" · "),
        rating = format_rating(work.rating.value),
    )
}

fn results_body(page: &BookPage, base: &str, query: Option<&str>) -> String {
    let mut body = String::new();

    if page.works.is_empty() {
        body.push_str(r#"<p class="meta">No books found.</p>"#);
    }
    for work in &page.works {
        body.push_str(&book_item(work));
        body.push('\n');
    }

    let p = &page.pagination;
    body.push_str(r#"<div class="pager">"#);
    if p.has_previous {
        body.push_str(&format!(
            r#"<a href="{}">Previous</a>"#,
            escape(&page_link(base, query, p.page - 1))
        ));
    }
    body.push_str(&format!(
        r#"<span class="meta">Page {} of {} ({} books)</span>"#,
        p.page,
        p.total_pages.max(1),
        p.total_results
    ));
    if p.has_next {
        body.push_str(&format!(
            r#"<a href="{}">Next</a>"#,
            escape(&page_link(base, query, p.page + 1))
        ));
    }
    body.push_str("</div>");

    body
}

/// Home page: the priority-ordered list
pub fn list_page(page: &BookPage) -> String {
    let body = format!("{}\n{}", search_form(""), results_body(page, "/", None));
    layout("Book Catalog", &body)
}

pub fn search_page(results: &SearchResults) -> String {
    let mode = match results.mode {
        SearchMode::All => "all books",
        SearchMode::FullText => "full-text match",
        SearchMode::Substring => "substring match",
    };
    let query = (!results.query.is_empty()).then_some(results.query.as_str());

    let body = format!(
        "{}\n<p class=\"meta\">Showing {} for &quot;{}&quot;</p>\n{}",
        search_form(&results.query),
        mode,
        escape(&results.query),
        results_body(&results.results, "/search/", query)
    );
    layout("Search - Book Catalog", &body)
}

pub fn detail_page(work: &Work) -> String {
    let cover = work
        .cover_url()
        .map(|url| format!(r#"<img src="{}" alt="Cover" style="max-width: 300px;">"#, escape(url)))
        .unwrap_or_default();

    let field = |name: &str, value: Option<&str>| {
        format!(
            "<dt>{}</dt><dd>{}</dd>",
            name,
            value.map(escape).unwrap_or_else(|| "-".to_string())
        )
    };

    let rating = format!(
        "<dt>Rating</dt><dd>{} <span class=\"meta\">({})</span></dd>",
        format_rating(work.rating.value),
        work.rating.source.label()
    );

    let body = format!(
        r#"<h1>{title}</h1>
{cover}
<dl>
{authors}
{isbn}
{year}
{publisher}
{rating}
<dt>Fame</dt><dd>{fame}</dd>
</dl>
<p><a href="/">Back to catalog</a></p>"#,
        title = escape(&work.title),
        cover = cover,
        authors = field("Authors", work.authors.as_deref()),
        isbn = field("ISBN", work.isbn.as_deref()),
        year = field("Year", work.year.as_deref()),
        publisher = field("Publisher", work.publisher.as_deref()),
        rating = rating,
        fame = work.fame,
    );
    layout(&work.title, &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"<div class="message">{}</div>
<p><a href="/">Back to catalog</a></p>"#,
        escape(message)
    );
    layout("Book Catalog", &body)
}
