//! HTML fragment rendering for board elements.
//!
//! DESIGN
//! ======
//! Every addressable fragment carries a stable element id (`column-{id}`,
//! `card-{id}`) that out-of-band updates are applied against on the client.
//! Rendering works on store snapshots only — no store lock is held while a
//! fragment is built. Snapshots carry their own affordance flags, so a
//! rendered column can never mix cards from one instant with affordances
//! from another.

use crate::services::board::{BoardStore, Card, CardId, ColumnId, ColumnSnapshot};

/// Stable element id of a column fragment.
#[must_use]
pub fn column_dom_id(column_id: ColumnId) -> String {
    format!("column-{column_id}")
}

/// Stable element id of a card fragment.
#[must_use]
pub fn card_dom_id(card_id: CardId) -> String {
    format!("card-{card_id}")
}

/// Minimal entity escaping for text interpolated into markup.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

// =============================================================================
// FRAGMENTS
// =============================================================================

/// One card with its demote/delete/promote affordances and an inline edit
/// form. The buttons mirror what the store actually permits, so a card in the
/// last column renders no promote control at all.
#[must_use]
pub fn card_fragment(card: &Card, can_promote: bool, can_demote: bool) -> String {
    let mut html = format!(
        r#"<div class="card" id="{id}"><h3>{title}</h3>"#,
        id = card_dom_id(card.id),
        title = escape_html(&card.title),
    );
    if !card.content.is_empty() {
        html.push_str(&format!("<p>{}</p>", escape_html(&card.content)));
    }
    html.push_str(&format!(
        concat!(
            r#"<details class="card-edit"><summary>Edit</summary>"#,
            r#"<form hx-patch="/cards/{id}" hx-swap="none">"#,
            r#"<input name="title" value="{title}" maxlength="100" required>"#,
            r#"<textarea name="content" maxlength="1000">{content}</textarea>"#,
            r#"<button type="submit">Save</button></form></details>"#,
        ),
        id = card.id,
        title = escape_html(&card.title),
        content = escape_html(&card.content),
    ));
    html.push_str(r#"<div class="card-actions">"#);
    if can_demote {
        html.push_str(&format!(
            r#"<button hx-post="/cards/{id}/demote" hx-swap="none" aria-label="demote">&larr;</button>"#,
            id = card.id
        ));
    }
    html.push_str(&format!(
        r#"<button hx-delete="/cards/{id}" hx-swap="none" aria-label="delete">&times;</button>"#,
        id = card.id
    ));
    if can_promote {
        html.push_str(&format!(
            r#"<button hx-post="/cards/{id}/promote" hx-swap="none" aria-label="promote">&rarr;</button>"#,
            id = card.id
        ));
    }
    html.push_str("</div></div>");
    html
}

/// One column with its cards in sequence order plus the new-card form.
#[must_use]
pub fn column_fragment(snapshot: &ColumnSnapshot) -> String {
    let mut html = format!(
        r#"<section class="column" id="{id}"><h2>{title}</h2><div class="cards">"#,
        id = column_dom_id(snapshot.column.id),
        title = escape_html(&snapshot.column.title),
    );
    for card in &snapshot.cards {
        html.push_str(&card_fragment(card, snapshot.can_promote, snapshot.can_demote));
    }
    html.push_str("</div>");
    html.push_str(&format!(
        concat!(
            r#"<form class="card-new" hx-post="/cards" hx-swap="none">"#,
            r#"<input type="hidden" name="column_id" value="{id}">"#,
            r#"<input name="title" placeholder="Title" maxlength="100" required>"#,
            r#"<textarea name="content" placeholder="Details" maxlength="1000"></textarea>"#,
            r#"<button type="submit">Add card</button></form>"#,
        ),
        id = snapshot.column.id
    ));
    html.push_str("</section>");
    html
}

/// The whole board: every column in ascending order.
#[must_use]
pub fn board_fragment(store: &BoardStore) -> String {
    let mut html = String::from(r#"<main class="board" id="board">"#);
    for snapshot in store.get_columns() {
        html.push_str(&column_fragment(&snapshot));
    }
    html.push_str("</main>");
    html
}

// =============================================================================
// PAGE SHELL
// =============================================================================

/// Full page: board markup plus the client bootstrap that applies batched
/// out-of-band updates by element id.
#[must_use]
pub fn board_page(store: &BoardStore) -> String {
    format!(
        concat!(
            "<!doctype html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<title>meshboard</title>",
            "<link rel=\"stylesheet\" href=\"/static/app.css\">",
            "<script src=\"https://unpkg.com/htmx.org@2\"></script>",
            "</head><body>",
            "{board}",
            "<script>\n",
            "const source = new EventSource(\"/sse\");\n",
            "source.addEventListener(\"oob-batch\", (event) => {{\n",
            "  const batch = JSON.parse(event.data);\n",
            "  for (const update of batch.updates) {{\n",
            "    const el = document.getElementById(update.id);\n",
            "    if (el) {{ el.outerHTML = update.html; htmx.process(document.getElementById(update.id)); }}\n",
            "  }}\n",
            "}});\n",
            "</script>",
            "</body></html>",
        ),
        board = board_fragment(store)
    )
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
