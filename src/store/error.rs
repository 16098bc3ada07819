use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store is already borrowed")]
    Borrow,
    #[error("Store is already mutably borrowed")]
    BorrowMut,
    #[error("Store backend error: {0}")]
    Backend(String),
}
