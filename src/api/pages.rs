//! Static marketing pages
//!
//! Small server-rendered documents. Every dynamic value is HTML-escaped.

use axum::{Router, extract::State, response::Html, routing::get};
use html_escape::encode_text;

use crate::AppState;
use crate::data::{AiTool, ListParams, MAX_PAGE_SIZE};
use crate::error::AppError;
use crate::service::ToolService;

/// Routes:
/// - GET / - Home page with the tool catalog
/// - GET /faq
/// - GET /pricing
/// - GET /terms
pub fn pages_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/faq", get(faq))
        .route("/pricing", get(pricing))
        .route("/terms", get(terms))
}

const FAQ: &[(&str, &str)] = &[
    (
        "Are the tools free?",
        "Most tools are free to use. Premium tools need an active premium plan.",
    ),
    (
        "Do you keep my files?",
        "Uploaded files are processed and discarded. We never sell your data.",
    ),
    (
        "Do I need an account?",
        "Free tools work without an account. Sign in to keep a history and unlock premium tools.",
    ),
    (
        "How do I contact support?",
        "Use the contact form. Messages marked urgent are answered first.",
    ),
];

fn layout(site_name: &str, title: &str, body: &str) -> Html<String> {
    let site_name = encode_text(site_name);
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} - {site_name}</title>
</head>
<body>
<header><a href="/">{site_name}</a> <nav><a href="/faq">FAQ</a> <a href="/pricing">Pricing</a> <a href="/terms">Terms</a></nav></header>
<main>
{body}
</main>
<footer>&copy; {site_name}</footer>
</body>
</html>
"#,
        title = encode_text(title),
    ))
}

fn tool_card(tool: &AiTool) -> String {
    let badge = if tool.is_premium {
        r#" <span class="badge">Premium</span>"#
    } else {
        ""
    };
    format!(
        r#"<li><a href="{route}"><strong>{name}</strong></a>{badge}<p>{description}</p></li>"#,
        route = html_escape::encode_double_quoted_attribute(&tool.route),
        name = encode_text(&tool.name),
        description = encode_text(&tool.description),
    )
}

pub(crate) fn render_home(site_name: &str, description: &str, tools: &[AiTool]) -> Html<String> {
    let cards: String = tools.iter().map(tool_card).collect();
    let body = format!(
        "<h1>{}</h1>\n<p>{}</p>\n<ul class=\"tools\">{}</ul>",
        encode_text(site_name),
        encode_text(description),
        cards
    );
    layout(site_name, "Home", &body)
}

async fn home(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let settings = state.settings.get(&state.db).await?;
    let params = ListParams {
        limit: Some(MAX_PAGE_SIZE),
        ..ListParams::default()
    };
    let tools = ToolService::new(state.db.clone())
        .list_active(&params)
        .await?;

    Ok(render_home(
        &settings.site_name,
        &settings.site_description,
        &tools.items,
    ))
}

async fn faq(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let settings = state.settings.get(&state.db).await?;
    let items: String = FAQ
        .iter()
        .map(|(question, answer)| format!("<dt>{question}</dt><dd>{answer}</dd>"))
        .collect();
    Ok(layout(
        &settings.site_name,
        "FAQ",
        &format!("<h1>Frequently asked questions</h1>\n<dl>{items}</dl>"),
    ))
}

async fn pricing(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let settings = state.settings.get(&state.db).await?;
    Ok(layout(
        &settings.site_name,
        "Pricing",
        r#"<h1>Pricing</h1>
<section><h2>Free</h2><p>$0 / month</p><ul><li>All free tools</li><li>Standard processing</li></ul></section>
<section><h2>Premium</h2><p>$9 / month</p><ul><li>Every tool, including premium</li><li>Priority processing</li><li>Priority support</li></ul></section>"#,
    ))
}

async fn terms(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    let settings = state.settings.get(&state.db).await?;
    let contact = encode_text(&settings.contact_email);
    Ok(layout(
        &settings.site_name,
        "Terms of Service",
        &format!(
            "<h1>Terms of Service</h1>\n<p>By using this site you agree to use the tools lawfully and not to upload content you do not have rights to.</p>\n<p>Premium plans renew monthly and can be cancelled at any time.</p>\n<p>Questions: <a href=\"mailto:{contact}\">{contact}</a></p>"
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    #[test]
    fn home_escapes_site_name_and_lists_tools() {
        let now = Utc::now();
        let tool = AiTool {
            id: "t1".to_string(),
            name: "PDF <Tools>".to_string(),
            description: "Merge & split".to_string(),
            category: "document".to_string(),
            icon: "file".to_string(),
            is_active: true,
            is_premium: true,
            usage_count: 0,
            route: "/tools/pdf-tools".to_string(),
            features: Json(Vec::new()),
            created_at: now,
            updated_at: now,
        };

        let Html(page) = render_home("<script>x</script> Hub", "Free tools", &[tool]);

        assert!(page.contains("&lt;script&gt;x&lt;/script&gt; Hub"));
        assert!(!page.contains("<script>"));
        assert!(page.contains("PDF &lt;Tools&gt;"));
        assert!(page.contains("Merge &amp; split"));
        assert!(page.contains(r#"href="/tools/pdf-tools""#));
        assert!(page.contains("Premium"));
    }
}
