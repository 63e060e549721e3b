pub mod http_client;
pub mod sheets_client;

pub use http_client::ReqwestProcessingClient;
pub use sheets_client::GoogleSheetsClient;
