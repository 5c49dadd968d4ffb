//! TUI-less ritual steps: throwing the blocks, drawing and looking up lots,
//! checking the interpreter.

use std::error::Error;
use std::io::Write;

use crate::core::app::LlmAvailability;
use crate::core::blocks::{throw_blocks, BlockThrow};
use crate::core::client::{ApiError, FortuneClient};

/// Gives up asking the blocks after this many throws without approval.
const MAX_THROWS: usize = 12;

fn print_throw(out: &mut impl Write, throw: &BlockThrow) -> std::io::Result<()> {
    let [first, second] = throw.faces;
    writeln!(
        out,
        "{} {}  {}",
        first.glyph(),
        second.glyph(),
        throw.outcome.message()
    )
}

pub fn run_throw(out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    print_throw(out, &throw_blocks())?;
    Ok(())
}

/// Throw until the deity approves, then draw a lot and print it.
pub async fn run_draw(
    client: &FortuneClient,
    skip_blocks: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    if !skip_blocks {
        throw_until_approved(out, throw_blocks)?;
    }

    let lot = client
        .draw_lot()
        .await
        .map_err(|err| format!("抽籤過程中發生錯誤，請稍後再試。({err})"))?;
    writeln!(out, "\n{}", lot.render_plain())?;
    Ok(())
}

fn throw_until_approved(
    out: &mut impl Write,
    mut throw: impl FnMut() -> BlockThrow,
) -> Result<(), Box<dyn Error>> {
    for _ in 0..MAX_THROWS {
        let result = throw();
        print_throw(out, &result)?;
        if result.outcome.advances() {
            return Ok(());
        }
    }
    Err(format!("神明 {MAX_THROWS} 次未允，請改日再來。").into())
}

pub async fn run_lot(
    client: &FortuneClient,
    number: u32,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    match client.lot_by_number(number).await {
        Ok(lot) => {
            writeln!(out, "{}", lot.render_plain())?;
            Ok(())
        }
        Err(ApiError::LotNotFound(number)) => Err(format!("沒有第 {number} 籤").into()),
        Err(err) => Err(err.into()),
    }
}

pub async fn run_status(client: &FortuneClient, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let probe = client.llm_status().await.map_err(|err| err.to_string());
    match LlmAvailability::from_probe(probe) {
        LlmAvailability::Connected => writeln!(out, "✅ AI 解籤已連線")?,
        LlmAvailability::Unavailable(message) => writeln!(out, "⚠️  {message}")?,
        LlmAvailability::Checking => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blocks::{BlockFace, ThrowOutcome};
    use crate::core::client::test_server::{closed_port_url, serve, CannedResponse};
    use std::time::Duration;

    const LOT_JSON: &str = r#"{"number":42,"title":"蘇秦不第","level":"下籤","poem":"一年作事急如飛","meaning":"凡事守舊","explanation":"宜待時"}"#;

    fn client(base_url: &str) -> FortuneClient {
        FortuneClient::new(base_url, Duration::from_secs(5)).expect("client")
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).expect("utf8")
    }

    #[test]
    fn throwing_stops_at_the_first_approval() {
        let mut throws = vec![
            BlockThrow::from_faces(BlockFace::FlatUp, BlockFace::FlatUp),
            BlockThrow::from_faces(BlockFace::FlatDown, BlockFace::FlatDown),
            BlockThrow::from_faces(BlockFace::FlatUp, BlockFace::FlatDown),
        ]
        .into_iter();
        let mut out = Vec::new();

        throw_until_approved(&mut out, || throws.next().expect("throw")).expect("approved");

        let text = output(out);
        assert_eq!(text.lines().count(), 3);
        assert!(text.ends_with(&format!("{}\n", ThrowOutcome::Sheng.message())));
    }

    #[test]
    fn throwing_gives_up_without_approval() {
        let mut out = Vec::new();
        let err = throw_until_approved(&mut out, || {
            BlockThrow::from_faces(BlockFace::FlatDown, BlockFace::FlatDown)
        })
        .expect_err("never approved");

        assert!(err.to_string().contains("未允"));
        assert_eq!(output(out).lines().count(), MAX_THROWS);
    }

    #[tokio::test]
    async fn draw_prints_the_lot() {
        let (base_url, captured) = serve(vec![CannedResponse::json(200, LOT_JSON)]).await;
        let mut out = Vec::new();

        run_draw(&client(&base_url), true, &mut out)
            .await
            .expect("draw");

        let text = output(out);
        assert!(text.contains("第 42 籤 · 下籤 · 蘇秦不第"));
        assert!(text.contains("【籤詩】"));
        assert_eq!(captured.lock().await[0].path(), "/api/draw");
    }

    #[tokio::test]
    async fn draw_failure_uses_the_alert_text() {
        let base_url = closed_port_url().await;
        let err = run_draw(&client(&base_url), true, &mut Vec::new())
            .await
            .expect_err("no server");
        assert!(err.to_string().starts_with("抽籤過程中發生錯誤"));
    }

    #[tokio::test]
    async fn unknown_lot_is_reported_by_number() {
        let (base_url, captured) =
            serve(vec![CannedResponse::json(404, r#"{"detail":"not found"}"#)]).await;

        let err = run_lot(&client(&base_url), 101, &mut Vec::new())
            .await
            .expect_err("missing");

        assert_eq!(err.to_string(), "沒有第 101 籤");
        assert_eq!(captured.lock().await[0].path(), "/api/lot/101");
    }

    #[tokio::test]
    async fn status_shows_server_message() {
        let (base_url, _) = serve(vec![CannedResponse::json(
            200,
            r#"{"ok":false,"message":"model not pulled"}"#,
        )])
        .await;
        let mut out = Vec::new();

        run_status(&client(&base_url), &mut out).await.expect("status");

        assert_eq!(output(out), "⚠️  model not pulled\n");
    }
}
