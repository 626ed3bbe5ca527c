use html_escape::encode_safe;

use crate::models::chat::Turn;

const PAGE_HEAD: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Grounded Chat</title>
<style>
body { font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }
.turn { margin-bottom: 1rem; }
.user { font-weight: bold; }
.assistant { white-space: pre-wrap; }
.error { color: #b00020; }
</style>
</head>
<body>
<h1>Grounded Chat</h1>
<div id="history">
"#;

const PAGE_TAIL: &str = r#"</div>
<form id="query-form">
<input id="query" name="query" autocomplete="off" size="60" placeholder="Ask a question">
<button type="submit">Send</button>
<button type="button" id="clear">Clear history</button>
</form>
<script>
const historyEl = document.getElementById("history");

function appendTurn(query, text, cls) {
  const turn = document.createElement("div");
  turn.className = "turn";
  const user = document.createElement("div");
  user.className = "user";
  user.textContent = "You: " + query;
  const reply = document.createElement("div");
  reply.className = cls;
  reply.textContent = text;
  turn.append(user, reply);
  historyEl.append(turn);
}

document.getElementById("query-form").addEventListener("submit", async (event) => {
  event.preventDefault();
  const input = document.getElementById("query");
  const query = input.value;
  input.value = "";
  const resp = await fetch("/query", {
    method: "POST",
    headers: { "Content-Type": "application/json" },
    body: JSON.stringify({ query }),
  });
  const body = await resp.json();
  if (resp.ok) {
    appendTurn(body.query, body.response, "assistant");
  } else {
    appendTurn(query, body.error, "error");
  }
});

document.getElementById("clear").addEventListener("click", async () => {
  await fetch("/clear", { method: "POST" });
  historyEl.replaceChildren();
});
</script>
</body>
</html>
"#;

/// Renders the chat page with the session's history. All history text is
/// HTML-escaped.
pub fn render_chat_page(history: &[Turn]) -> String {
    let mut html = String::from(PAGE_HEAD);
    for turn in history {
        html.push_str("<div class=\"turn\"><div class=\"user\">You: ");
        html.push_str(&encode_safe(&turn.query));
        html.push_str("</div><div class=\"assistant\">");
        html.push_str(&encode_safe(&turn.response));
        html.push_str("</div></div>\n");
    }
    html.push_str(PAGE_TAIL);
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_text_is_escaped() {
        let history = vec![Turn::new("<script>alert(1)</script>", "a & b \"quoted\"")];
        let html = render_chat_page(&history);

        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("You: &lt;script&gt;alert(1)"));
        assert!(html.contains("a &amp; b &quot;quoted&quot;"));
    }

    #[test]
    fn turns_render_in_order() {
        let history = vec![Turn::new("first", "one"), Turn::new("second", "two")];
        let html = render_chat_page(&history);

        let first = html.find("You: first").unwrap();
        let second = html.find("You: second").unwrap();
        assert!(first < second);
    }
}
