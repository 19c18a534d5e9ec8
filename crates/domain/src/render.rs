use crate::hooks::EditHooks;
use crate::models::Comment;

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escaped text split into paragraphs on blank lines, single newlines kept
/// as `<br />`.
pub fn format_paragraphs(content: &str) -> String {
    let normalized = content.replace("\r\n", "\n");
    normalized
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let lines: Vec<String> = p.lines().map(|l| escape_html(l.trim_end())).collect();
            format!("<p>{}</p>", lines.join("<br />\n"))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_comment_text(comment: &Comment, hooks: &dyn EditHooks) -> String {
    hooks.comment_text(format_paragraphs(&comment.content), comment)
}

pub struct EditInterface<'a> {
    pub comment: &'a Comment,
    pub rendered: &'a str,
    pub edit_nonce: &'a str,
    pub allow_delete: bool,
}

/// Rendered comment wrapped for the client script, followed by the hidden
/// editing widget.
pub fn render_edit_interface(view: &EditInterface<'_>, hooks: &dyn EditHooks) -> String {
    let comment = view.comment;
    let id = comment.id;
    let post_id = comment.post_id;

    let wrapper = format!(
        r#"<div id="revise-comment{id}" class="revise-comment">{}</div>"#,
        view.rendered
    );

    let mut widget = format!(
        r#"<div id="revise-edit-comment{id}" class="revise-edit-comment" data-comment-id="{id}" data-post-id="{post_id}" data-nonce="{}">"#,
        escape_html(view.edit_nonce)
    );
    widget.push_str(r#"<div class="revise-edit-button" style="display:none;">"#);
    widget.push_str(r##"<a href="#">Click to edit.</a><span class="revise-timer"></span>"##);
    widget.push_str("</div>");
    widget.push_str(r#"<div class="revise-loading" style="display:none;">Loading</div>"#);

    let raw = hooks.textarea_content(comment.content.clone(), comment);
    widget.push_str(r#"<div class="revise-textarea" style="display:none;">"#);
    widget.push_str(&format!(
        r#"<div class="revise-comment-textarea"><textarea class="revise-comment-text" cols="45" rows="8">{}</textarea></div>"#,
        escape_html(&raw)
    ));
    widget.push_str(&hooks.extra_fields(post_id, id));

    let mut buttons = String::from(r#"<button class="revise-comment-save">Save</button>"#);
    buttons.push_str(r#"<button class="revise-comment-cancel">Cancel</button>"#);
    if view.allow_delete {
        buttons.push_str(r#"<button class="revise-comment-delete">Delete</button>"#);
    }
    buttons.push_str(r#"<div class="revise-timer"></div>"#);
    widget.push_str(r#"<div class="revise-comment-edit-buttons">"#);
    widget.push_str(&hooks.buttons(buttons, id));
    widget.push_str("</div></div></div>");

    widget.push_str(&format!(
        r#"<div id="revise-edit-comment-status{id}" class="revise-status" style="display:none;"></div>"#
    ));

    format!("{}{}", wrapper, hooks.edit_widget(widget, id))
}
