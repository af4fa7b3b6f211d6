//! Data models for the catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod form;
pub mod genre;

// Re-export commonly used types
pub use author::{Author, AuthorForm, AuthorView};
pub use book::{Book, BookForm, BookView, PopulatedBook};
pub use book_instance::{
    BookInstance, BookInstanceForm, BookInstanceStatus, BookInstanceView, PopulatedBookInstance,
};
pub use form::{FieldValue, FieldViolation, FormOutcome, PickListEntry, Redisplay};
pub use genre::{Genre, GenreForm, GenreView};
