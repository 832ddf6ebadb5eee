mod requests;
mod responses;

pub use requests::GetQuery;
pub use responses::{PutResponse, PutResponseObject};
