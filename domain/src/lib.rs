use chrono::NaiveDate; // Publication date, serialized as YYYY-MM-DD
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error; // For domain-specific errors

// --- Domain Errors ---
#[derive(Error, Debug, PartialEq)]
pub enum DomainError {
    #[error("Search keyword cannot be empty")]
    EmptyKeyword,
}

// --- Book ID ---
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookId(String);

impl BookId {
    pub fn new(id: String) -> Self {
        Self(id)
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// True when no identifier has been assigned yet (e.g. a create payload).
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl From<String> for BookId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}
impl From<&str> for BookId {
    fn from(id: &str) -> Self {
        Self::new(id.to_string())
    }
}
impl From<BookId> for String {
    fn from(book_id: BookId) -> Self {
        book_id.0
    }
}
impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// --- Book ---

/// One catalog entry.
///
/// Field names use camelCase both on the wire and in the data file. The
/// identifier may be omitted from request bodies; it is assigned by the
/// catalog on creation and never changes afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "bookId", default)]
    pub id: BookId,
    pub author_id: String,
    pub publisher_id: String,
    pub title: String,
    pub publication_date: NaiveDate,
    pub isbn: String,
    pub pages: u32,
    pub genre: String,
    pub description: String,
    pub price: f64,
    pub quantity: u32,
}

impl Book {
    pub fn id(&self) -> &BookId {
        &self.id
    }

    /// Returns the same book carrying `id`.
    pub fn with_id(mut self, id: BookId) -> Self {
        self.id = id;
        self
    }

    /// Case-insensitive substring match on title or description.
    pub fn matches(&self, keyword: &Keyword) -> bool {
        let needle = keyword.needle();
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

// --- Keyword ---

/// A validated, non-empty search keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    raw: String,
    needle: String, // lowercased once, reused for every comparison
}

impl Keyword {
    pub fn parse(raw: &str) -> Result<Self, DomainError> {
        if raw.is_empty() {
            return Err(DomainError::EmptyKeyword);
        }
        Ok(Self {
            raw: raw.to_string(),
            needle: raw.to_lowercase(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn needle(&self) -> &str {
        &self.needle
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_book() -> Book {
        Book {
            id: BookId::from("42"),
            author_id: "a-1".to_string(),
            publisher_id: "p-1".to_string(),
            title: "The Great Gatsby".to_string(),
            publication_date: NaiveDate::from_ymd_opt(1925, 4, 10).unwrap(),
            isbn: "9780743273565".to_string(),
            pages: 180,
            genre: "Novel".to_string(),
            description: "Jazz age classic".to_string(),
            price: 10.99,
            quantity: 3,
        }
    }

    #[test]
    fn book_serializes_with_camel_case_and_plain_date() {
        let value = serde_json::to_value(sample_book()).unwrap();
        assert_eq!(value["bookId"], json!("42"));
        assert_eq!(value["authorId"], json!("a-1"));
        assert_eq!(value["publisherId"], json!("p-1"));
        assert_eq!(value["publicationDate"], json!("1925-04-10"));
        assert_eq!(value["pages"], json!(180));
    }

    #[test]
    fn book_id_is_optional_in_payload() {
        let book: Book = serde_json::from_value(json!({
            "authorId": "a", "publisherId": "p", "title": "t",
            "publicationDate": "2001-02-03", "isbn": "i", "pages": 1,
            "genre": "g", "description": "d", "price": 1.5, "quantity": 2
        }))
        .unwrap();
        assert!(book.id().is_empty());
        assert_eq!(
            book.publication_date,
            NaiveDate::from_ymd_opt(2001, 2, 3).unwrap()
        );
    }

    #[test]
    fn book_rejects_wrong_date_format() {
        let result: Result<Book, _> = serde_json::from_value(json!({
            "authorId": "a", "publisherId": "p", "title": "t",
            "publicationDate": "03/02/2001", "isbn": "i", "pages": 1,
            "genre": "g", "description": "d", "price": 1.5, "quantity": 2
        }));
        assert!(result.is_err());
    }

    #[test]
    fn book_rejects_wrong_field_type() {
        let result: Result<Book, _> = serde_json::from_value(json!({
            "authorId": "a", "publisherId": "p", "title": "t",
            "publicationDate": "2001-02-03", "isbn": "i", "pages": "many",
            "genre": "g", "description": "d", "price": 1.5, "quantity": 2
        }));
        assert!(result.is_err());
    }

    #[test]
    fn keyword_rejects_only_empty_input() {
        assert_eq!(Keyword::parse(""), Err(DomainError::EmptyKeyword));
        let space = Keyword::parse(" ").unwrap();
        assert_eq!(space.needle(), " ");
    }

    #[test]
    fn space_keyword_matches_multi_word_title() {
        let keyword = Keyword::parse(" ").unwrap();
        assert!(sample_book().matches(&keyword));
        let mut single = sample_book();
        single.title = "Dune".to_string();
        single.description = "Spice".to_string();
        assert!(!single.matches(&keyword));
    }

    #[test]
    fn matches_title_or_description_ignoring_case() {
        let book = sample_book();
        assert!(book.matches(&Keyword::parse("great").unwrap()));
        assert!(book.matches(&Keyword::parse("JAZZ").unwrap()));
        assert!(!book.matches(&Keyword::parse("novel").unwrap())); // genre is not searched
    }

    #[test]
    fn with_id_replaces_identifier() {
        let book = sample_book().with_id(BookId::from("7"));
        assert_eq!(book.id().as_str(), "7");
    }
}
