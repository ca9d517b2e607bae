// About page client
// Fetches /about from REACT_APP_SERVER_HOSTNAME once and prints the result

use message_board::client::{AboutView, HttpAboutSource, ViewState};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let _ = dotenvy::dotenv();

    let source = HttpAboutSource::from_env();
    let mut view = AboutView::new();
    println!("{}", view.render());

    view.load(&source).await;
    match view.state() {
        ViewState::Error(_) => {
            eprintln!("{}", view.render());
            std::process::ExitCode::FAILURE
        }
        _ => {
            println!("{}", view.render());
            std::process::ExitCode::SUCCESS
        }
    }
}
