pub mod book;
pub mod user;

pub use book::{
    Book, BookCreationRequest, BookList, BookListingRequest, BookModificationRequest, BookRow,
};
pub use user::{User, UserCreationRequest, UserList, UserModificationRequest};
