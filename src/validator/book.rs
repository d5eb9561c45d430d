use super::{UniquenessLookup, ValidationError, ValidatorError};
use crate::database::models::{BookCreationRequest, BookListingRequest, BookModificationRequest};

pub async fn validate_book_creation<L: UniquenessLookup + ?Sized>(
    lookup: &L,
    owner_id: i64,
    request: &BookCreationRequest,
) -> Result<(), ValidatorError> {
    if request.title.is_empty() {
        return Err(ValidationError::MissingTitle.into());
    }
    if lookup.title_taken(owner_id, &request.title, None).await? {
        return Err(ValidationError::BookAlreadyExists.into());
    }
    check_image_url(&request.image_url)?;
    check_price(request.price)?;
    Ok(())
}

/// Only fields present in the patch are checked; the title check ignores the book itself.
pub async fn validate_book_modification<L: UniquenessLookup + ?Sized>(
    lookup: &L,
    owner_id: i64,
    book_id: i64,
    patch: &BookModificationRequest,
) -> Result<(), ValidatorError> {
    if let Some(title) = &patch.title {
        if title.is_empty() {
            return Err(ValidationError::MissingTitle.into());
        }
        if lookup.title_taken(owner_id, title, Some(book_id)).await? {
            return Err(ValidationError::BookAlreadyExists.into());
        }
    }
    if let Some(image_url) = &patch.image_url {
        check_image_url(image_url)?;
    }
    if let Some(price) = patch.price {
        check_price(price)?;
    }
    Ok(())
}

/// Search parameters. Prices must be strictly positive here even though the
/// query builder accepts zero.
pub fn validate_book_listing(request: &BookListingRequest) -> Result<(), ValidationError> {
    if matches!(request.author_id, Some(id) if id <= 0) {
        return Err(ValidationError::InvalidAuthorId);
    }
    if matches!(&request.description, Some(d) if d.is_empty()) {
        return Err(ValidationError::InvalidSearchDescription);
    }
    if matches!(&request.title, Some(t) if t.is_empty()) {
        return Err(ValidationError::InvalidSearchTitle);
    }
    if matches!(request.min_price, Some(p) if p <= 0) {
        return Err(ValidationError::InvalidMinPrice);
    }
    if matches!(request.max_price, Some(p) if p <= 0) {
        return Err(ValidationError::InvalidMaxPrice);
    }
    if let (Some(min), Some(max)) = (request.min_price, request.max_price) {
        if min > max {
            return Err(ValidationError::InvalidPriceRange);
        }
    }
    if matches!(request.limit, Some(l) if l <= 0) {
        return Err(ValidationError::InvalidLimit);
    }
    if matches!(request.offset, Some(o) if o < 0) {
        return Err(ValidationError::InvalidOffset);
    }
    Ok(())
}

fn check_image_url(image_url: &str) -> Result<(), ValidationError> {
    if !image_url.is_empty() && url::Url::parse(image_url).is_err() {
        return Err(ValidationError::InvalidImageUrl);
    }
    Ok(())
}

fn check_price(price: i64) -> Result<(), ValidationError> {
    if price < 0 {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(())
}
