use anyhow::{anyhow, Context};
use serde::Serialize;
use serde_json::Value;

use domain::protocol::{EditResponse, TimeLeft};

const BASE_URL: &str = "http://127.0.0.1:3000";
const POST_ID: i64 = 1;

#[derive(Serialize)]
struct CreateCommentRequest {
    author_name: String,
    author_email: String,
    content: String,
}

/// Walks one anonymous comment through its edit window: post, edit, delete.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 编辑 cookie 需要在请求之间保留
    let client = reqwest::Client::builder()
        .cookie_store(true)
        .user_agent("revise-demo-client/0.1")
        .build()?;
    println!("Starting Revise demo client...");

    println!("\n[1/5] Posting comment...");
    let payload = CreateCommentRequest {
        author_name: "Rust Client".into(),
        author_email: "client@example.org".into(),
        content: "Hello from the demo client, with a tpyo.".into(),
    };
    let created: Value = client
        .post(format!("{}/api/posts/{}/comments", BASE_URL, POST_ID))
        .json(&payload)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let comment_id = created["comment"]["id"]
        .as_i64()
        .ok_or_else(|| anyhow!("response has no comment id: {}", created))?;
    println!("   -> Comment {} ({})", comment_id, created["comment"]["approval"]);
    match created["cookie"]["name"].as_str() {
        Some(name) => println!("   -> Edit cookie: {}", name),
        None => println!("   -> No edit cookie issued"),
    }

    println!("\n[2/5] Listing comments...");
    let list: Value = client
        .get(format!("{}/api/posts/{}/comments", BASE_URL, POST_ID))
        .send()
        .await?
        .json()
        .await?;
    let general_nonce = list["nonce"]
        .as_str()
        .context("listing has no nonce")?
        .to_string();
    let ours = list["comments"]
        .as_array()
        .and_then(|items| items.iter().find(|c| c["id"].as_i64() == Some(comment_id)))
        .context("posted comment missing from listing")?;
    println!("   -> Editable: {}", ours["editable"]);
    let edit_nonce = ours["html"]
        .as_str()
        .and_then(data_nonce)
        .context("no edit widget in comment markup")?;

    println!("\n[3/5] Checking time left...");
    let left: TimeLeft = ajax(&client, "get_time_left", comment_id, &general_nonce, None)
        .await?
        .json()
        .await?;
    println!("   -> {}m {}s left", left.minutes, left.seconds);

    println!("\n[4/5] Saving edit...");
    let saved: EditResponse = ajax(
        &client,
        "save_comment",
        comment_id,
        &edit_nonce,
        Some("Hello from the demo client, typo fixed."),
    )
    .await?
    .json()
    .await?;
    if saved.errors {
        println!("   -> Failed: {}", saved.error);
    } else {
        println!("   -> Saved: {}", saved.comment_text.unwrap_or_default());
    }

    println!("\n[5/5] Deleting comment...");
    let deleted: EditResponse = ajax(&client, "delete_comment", comment_id, &edit_nonce, None)
        .await?
        .json()
        .await?;
    if deleted.errors {
        println!("   -> Failed: {}", deleted.error);
    } else {
        println!("   -> Moved to trash");
    }

    Ok(())
}

async fn ajax(
    client: &reqwest::Client,
    action: &str,
    comment_id: i64,
    nonce: &str,
    content: Option<&str>,
) -> anyhow::Result<reqwest::Response> {
    let comment_id = comment_id.to_string();
    let post_id = POST_ID.to_string();
    let mut form = vec![
        ("action", action),
        ("comment_id", comment_id.as_str()),
        ("post_id", post_id.as_str()),
        ("nonce", nonce),
    ];
    if let Some(content) = content {
        form.push(("comment_content", content));
    }
    let resp = client
        .post(format!("{}/api/ajax", BASE_URL))
        .form(&form)
        .send()
        .await?
        .error_for_status()?;
    Ok(resp)
}

fn data_nonce(html: &str) -> Option<String> {
    let start = html.find("data-nonce=\"")? + "data-nonce=\"".len();
    let len = html[start..].find('"')?;
    Some(html[start..start + len].to_string())
}
