use futures::TryStreamExt;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool};
use sqlx::query::QueryAs;

use crate::database::manager::{Entity, StoreError};
use crate::database::models::{Book, BookListingRequest, BookRow};

const SELECT_BOOKS: &str = "SELECT b.book_id, b.user_id, b.title, b.description, b.price, b.image_url, \
     u.username, u.pseudonym, u.is_admin \
     FROM books b INNER JOIN users u ON u.user_id = b.user_id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortDirection::Asc),
            "desc" => Some(SortDirection::Desc),
            _ => None,
        }
    }
}

/// Sortable book columns. Titles sort by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    Id,
    #[default]
    Title,
    Price,
}

impl BookSort {
    pub fn to_sql(&self) -> &'static str {
        match self {
            BookSort::Id => "b.book_id",
            BookSort::Title => "b.title",
            BookSort::Price => "b.price",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "id" => Some(BookSort::Id),
            "title" => Some(BookSort::Title),
            "price" => Some(BookSort::Price),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlParam {
    Int(i64),
    Text(String),
}

/// Rendered SQL plus its positional parameters (`?1`, `?2`, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlStatement {
    pub query: String,
    pub params: Vec<SqlParam>,
}

impl SqlStatement {
    fn push(&mut self, param: SqlParam) -> String {
        self.params.push(param);
        format!("?{}", self.params.len())
    }
}

/// Read query over books joined with their owners.
///
/// Every step takes and returns the builder by value. Filter values that are not
/// sane (ids <= 0, negative prices, empty strings) are ignored rather than
/// rejected; request validation happens before a query is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookQuery {
    owner_id: Option<i64>,
    book_id: Option<i64>,
    min_price: Option<i64>,
    max_price: Option<i64>,
    title: Option<String>,
    description: Option<String>,
    sort: BookSort,
    direction: SortDirection,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl BookQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_listing(request: &BookListingRequest) -> Self {
        let mut query = Self::new().order_by(
            request.order.unwrap_or_default(),
            request.direction.unwrap_or_default(),
        );
        if let Some(id) = request.author_id {
            query = query.owner(id);
        }
        if let Some(price) = request.min_price {
            query = query.min_price(price);
        }
        if let Some(price) = request.max_price {
            query = query.max_price(price);
        }
        if let Some(title) = &request.title {
            query = query.title_contains(title);
        }
        if let Some(description) = &request.description {
            query = query.description_contains(description);
        }
        if let Some(limit) = request.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = request.offset {
            query = query.offset(offset);
        }
        query
    }

    pub fn owner(mut self, user_id: i64) -> Self {
        if user_id > 0 {
            self.owner_id = Some(user_id);
        }
        self
    }

    pub fn book(mut self, book_id: i64) -> Self {
        if book_id > 0 {
            self.book_id = Some(book_id);
        }
        self
    }

    pub fn min_price(mut self, price: i64) -> Self {
        if price >= 0 {
            self.min_price = Some(price);
        }
        self
    }

    pub fn max_price(mut self, price: i64) -> Self {
        if price >= 0 {
            self.max_price = Some(price);
        }
        self
    }

    pub fn title_contains(mut self, title: &str) -> Self {
        if !title.is_empty() {
            self.title = Some(title.to_string());
        }
        self
    }

    pub fn description_contains(mut self, description: &str) -> Self {
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
        self
    }

    pub fn order_by(mut self, sort: BookSort, direction: SortDirection) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        if limit > 0 {
            self.limit = Some(limit);
        }
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        if offset > 0 {
            self.offset = Some(offset);
        }
        self
    }

    pub fn to_sql(&self) -> SqlStatement {
        let mut statement = SqlStatement {
            query: String::new(),
            params: Vec::new(),
        };
        let mut conditions = Vec::new();

        if let Some(id) = self.owner_id {
            conditions.push(format!("b.user_id = {}", statement.push(SqlParam::Int(id))));
        }
        if let Some(id) = self.book_id {
            conditions.push(format!("b.book_id = {}", statement.push(SqlParam::Int(id))));
        }
        if let Some(price) = self.min_price {
            conditions.push(format!("b.price >= {}", statement.push(SqlParam::Int(price))));
        }
        if let Some(price) = self.max_price {
            conditions.push(format!("b.price <= {}", statement.push(SqlParam::Int(price))));
        }
        if let Some(title) = &self.title {
            let p = statement.push(SqlParam::Text(like_pattern(title)));
            conditions.push(format!("b.title LIKE {} ESCAPE '\\'", p));
        }
        if let Some(description) = &self.description {
            let p = statement.push(SqlParam::Text(like_pattern(description)));
            conditions.push(format!("b.description LIKE {} ESCAPE '\\'", p));
        }

        let condition = if conditions.is_empty() {
            "1".to_string()
        } else {
            conditions.join(" AND ")
        };

        let mut query = format!(
            "{} WHERE {} ORDER BY {} {}, b.book_id ASC",
            SELECT_BOOKS,
            condition,
            self.sort.to_sql(),
            self.direction.to_sql()
        );

        // SQLite only accepts OFFSET after a LIMIT; -1 means unbounded.
        match (self.limit, self.offset) {
            (Some(limit), offset) => {
                query.push_str(&format!(" LIMIT {}", statement.push(SqlParam::Int(limit))));
                if let Some(offset) = offset {
                    query.push_str(&format!(" OFFSET {}", statement.push(SqlParam::Int(offset))));
                }
            }
            (None, Some(offset)) => {
                query.push_str(&format!(" LIMIT -1 OFFSET {}", statement.push(SqlParam::Int(offset))));
            }
            (None, None) => {}
        }

        statement.query = query;
        statement
    }

    pub async fn fetch_many(&self, pool: &SqlitePool) -> Result<Vec<Book>, StoreError> {
        let statement = self.to_sql();
        tracing::debug!(sql = %statement.query, params = ?statement.params, "Fetching books");

        let mut query = sqlx::query_as::<_, BookRow>(&statement.query);
        for param in &statement.params {
            query = bind_param(query, param);
        }

        query
            .fetch(pool)
            .map_ok(Book::from)
            .try_collect::<Vec<_>>()
            .await
            .map_err(StoreError::query(Entity::Book, "select"))
    }

    /// The single matching book, `None` without a match, and
    /// [`StoreError::AmbiguousMatch`] when the filters match several rows.
    pub async fn fetch_one(&self, pool: &SqlitePool) -> Result<Option<Book>, StoreError> {
        let mut limited = self.clone();
        limited.limit = Some(2);

        let mut books = limited.fetch_many(pool).await?;
        match books.len() {
            0 | 1 => Ok(books.pop()),
            _ => Err(StoreError::AmbiguousMatch(Entity::Book)),
        }
    }
}

fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn bind_param<'q>(
    query: QueryAs<'q, Sqlite, BookRow, SqliteArguments<'q>>,
    param: &SqlParam,
) -> QueryAs<'q, Sqlite, BookRow, SqliteArguments<'q>> {
    match param {
        SqlParam::Int(value) => query.bind(*value),
        SqlParam::Text(value) => query.bind(value.clone()),
    }
}
