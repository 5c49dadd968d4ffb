use crate::core::app::App;
use crate::core::client::FortuneClient;
use crate::core::lot::Lot;

pub fn create_test_app() -> App {
    App::new(FortuneClient::with_http_client(
        reqwest::Client::new(),
        "http://127.0.0.1:9",
    ))
}

pub fn sample_lot(number: u32) -> Lot {
    Lot {
        number,
        title: "蘇秦不第".to_string(),
        level: Some("下籤".to_string()),
        poem: "一紙官書火急催\n扁舟速下浪如雷".to_string(),
        story: None,
        meaning: "凡事宜謹慎".to_string(),
        explanation: "目前不宜躁進".to_string(),
    }
}
