use serde::Deserialize;

/// SQL query builder for the product listing endpoint
/// Builds a single parameterized query with filters, sorting, and pagination
///
/// All filter parameters are bound as text and cast in SQL, so the builder
/// only ever deals in one parameter type.
pub struct SQLQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl SQLQueryBuilder {
    /// Creates a new SQLQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            base_query: "SELECT * FROM products".to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 10,
            offset: 0,
        }
    }

    /// Scopes the query to one shop; must always be applied first
    pub fn add_shop_filter(&mut self, shop_id: i32) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("shop_id = CAST(${} AS INTEGER)", param_index));
        self.params.push(shop_id.to_string());
    }

    /// Adds a search filter for partial name matching (case-insensitive)
    pub fn add_search_filter(&mut self, search: &str) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("name ILIKE ${}", param_index));
        self.params.push(format!("%{}%", search));
    }

    /// Adds a category filter
    pub fn add_category_filter(&mut self, category_id: i32) {
        let param_index = self.params.len() + 1;
        self.where_clauses
            .push(format!("category_id = CAST(${} AS INTEGER)", param_index));
        self.params.push(category_id.to_string());
    }

    /// Adds sell-price range filters (min and/or max, both inclusive)
    pub fn add_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min_price) = min {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("sell_price >= CAST(${} AS NUMERIC)", param_index));
            self.params.push(min_price.to_string());
        }

        if let Some(max_price) = max {
            let param_index = self.params.len() + 1;
            self.where_clauses
                .push(format!("sell_price <= CAST(${} AS NUMERIC)", param_index));
            self.params.push(max_price.to_string());
        }
    }

    /// Restricts the listing to products at or below their stock threshold
    pub fn add_low_stock_filter(&mut self) {
        self.where_clauses
            .push("current_stock <= stock_threshold".to_string());
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: SortField, order: SortOrder) {
        let field_name = match field {
            SortField::Name => "name",
            SortField::Price => "sell_price",
            SortField::Stock => "current_stock",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT and OFFSET are validated integers, inlined directly
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

/// Query parameters extracted from the HTTP request
/// All fields optional to support flexible querying
#[derive(Debug, Deserialize)]
pub struct QueryParams {
    /// Search term for partial name matching (case-insensitive)
    pub search: Option<String>,
    /// Filter by category id
    pub category_id: Option<i32>,
    /// Minimum sell price filter (inclusive)
    pub min_price: Option<f64>,
    /// Maximum sell price filter (inclusive)
    pub max_price: Option<f64>,
    /// Only products at or below their stock threshold
    pub low_stock: Option<bool>,
    /// Sort field: "name", "price" or "stock"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 10)
    pub limit: Option<u32>,
}

/// Sort field options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Price,
    Stock,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized query parameters
#[derive(Debug)]
pub struct ValidatedQuery {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub low_stock: bool,
    pub sort_field: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type
#[derive(Debug)]
pub struct ValidationError {
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Query parameter validator
pub struct QueryValidator;

impl QueryValidator {
    /// Validates and normalizes query parameters
    pub fn validate(params: QueryParams) -> Result<ValidatedQuery, ValidationError> {
        let search = Self::normalize_string(params.search);

        let category_id = match params.category_id {
            Some(id) if id <= 0 => {
                return Err(ValidationError {
                    message: "category_id must be a positive number".to_string(),
                });
            }
            other => other,
        };

        let min_price = if let Some(price) = params.min_price {
            Self::validate_price(price, "min_price")?;
            Some(price)
        } else {
            None
        };

        let max_price = if let Some(price) = params.max_price {
            Self::validate_price(price, "max_price")?;
            Some(price)
        } else {
            None
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(ValidationError {
                    message: "min_price cannot be greater than max_price".to_string(),
                });
            }
        }

        let sort_field = if let Some(sort_str) = params.sort {
            Some(Self::parse_sort_field(&sort_str)?)
        } else {
            None
        };

        let sort_order = if let Some(order_str) = params.order {
            Self::parse_sort_order(&order_str)?
        } else {
            SortOrder::Asc
        };

        let page = if let Some(p) = params.page {
            Self::validate_pagination_param(p, "page")?;
            p
        } else {
            1
        };

        let limit = if let Some(l) = params.limit {
            Self::validate_pagination_param(l, "limit")?;
            l
        } else {
            10
        };

        Ok(ValidatedQuery {
            search,
            category_id,
            min_price,
            max_price,
            low_stock: params.low_stock.unwrap_or(false),
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Normalizes string parameters by trimming whitespace
    /// Returns None if the string is empty or whitespace-only
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    /// Validates that a price filter is positive and finite
    fn validate_price(price: f64, param_name: &str) -> Result<(), ValidationError> {
        if price <= 0.0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number", param_name),
            });
        }
        if price.is_nan() || price.is_infinite() {
            return Err(ValidationError {
                message: format!("{} must be a valid number", param_name),
            });
        }
        Ok(())
    }

    fn parse_sort_field(s: &str) -> Result<SortField, ValidationError> {
        match s.to_lowercase().as_str() {
            "name" => Ok(SortField::Name),
            "price" => Ok(SortField::Price),
            "stock" => Ok(SortField::Stock),
            _ => Err(ValidationError {
                message: format!(
                    "Invalid sort field '{}'. Must be 'name', 'price' or 'stock'",
                    s
                ),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, ValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }

    fn validate_pagination_param(value: u32, param_name: &str) -> Result<(), ValidationError> {
        if value == 0 {
            return Err(ValidationError {
                message: format!("{} must be a positive number (greater than 0)", param_name),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_builder_basic_query() {
        let builder = SQLQueryBuilder::new();
        let (query, params) = builder.build();

        assert!(query.contains("SELECT * FROM products"));
        assert!(query.contains("LIMIT"));
        assert!(query.contains("OFFSET"));
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_sql_builder_shop_scope_first() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_shop_filter(7);
        builder.add_search_filter("beans");
        let (query, params) = builder.build();

        assert!(query.contains("shop_id = CAST($1 AS INTEGER)"));
        assert!(query.contains("name ILIKE $2"));
        assert_eq!(params[0], "7");
        assert_eq!(params[1], "%beans%");
    }

    #[test]
    fn test_sql_builder_with_price_range() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_price_range(Some(5.0), Some(10.0));
        let (query, params) = builder.build();

        assert!(query.contains("sell_price >= CAST($1 AS NUMERIC)"));
        assert!(query.contains("sell_price <= CAST($2 AS NUMERIC)"));
        assert_eq!(params[0], "5");
        assert_eq!(params[1], "10");
    }

    #[test]
    fn test_sql_builder_low_stock_adds_no_params() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_low_stock_filter();
        let (query, params) = builder.build();

        assert!(query.contains("current_stock <= stock_threshold"));
        assert_eq!(params.len(), 0);
    }

    #[test]
    fn test_sql_builder_with_sorting_and_pagination() {
        let mut builder = SQLQueryBuilder::new();
        builder.set_sort(SortField::Stock, SortOrder::Asc);
        builder.set_pagination(3, 20);
        let (query, _) = builder.build();

        assert!(query.contains("ORDER BY current_stock ASC"));
        assert!(query.contains("LIMIT 20"));
        assert!(query.contains("OFFSET 40"));
    }

    #[test]
    fn test_sql_builder_combined_filters() {
        let mut builder = SQLQueryBuilder::new();
        builder.add_shop_filter(1);
        builder.add_search_filter("blend");
        builder.add_category_filter(4);
        builder.add_price_range(Some(3.0), None);
        builder.set_sort(SortField::Price, SortOrder::Desc);

        let (query, params) = builder.build();

        assert!(query.contains("WHERE"));
        assert!(query.contains(" AND "));
        assert!(query.contains("category_id = CAST($3 AS INTEGER)"));
        assert!(query.contains("sell_price >= CAST($4 AS NUMERIC)"));
        assert!(query.contains("ORDER BY sell_price DESC"));
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn test_normalize_string_with_whitespace() {
        assert_eq!(
            QueryValidator::normalize_string(Some("  beans  ".to_string())),
            Some("beans".to_string())
        );
        assert_eq!(QueryValidator::normalize_string(Some("   ".to_string())), None);
        assert_eq!(QueryValidator::normalize_string(None), None);
    }

    #[test]
    fn test_validate_price_bounds() {
        assert!(QueryValidator::validate_price(10.0, "price").is_ok());
        assert!(QueryValidator::validate_price(0.0, "price").is_err());
        assert!(QueryValidator::validate_price(-5.0, "price").is_err());
        assert!(QueryValidator::validate_price(f64::NAN, "price").is_err());
    }

    #[test]
    fn test_parse_sort_field() {
        assert_eq!(
            QueryValidator::parse_sort_field("price").unwrap(),
            SortField::Price
        );
        assert_eq!(
            QueryValidator::parse_sort_field("STOCK").unwrap(),
            SortField::Stock
        );
        assert!(QueryValidator::parse_sort_field("rating").is_err());
    }

    #[test]
    fn test_validate_full_query_with_defaults() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            low_stock: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        let validated = QueryValidator::validate(params).unwrap();
        assert_eq!(validated.page, 1);
        assert_eq!(validated.limit, 10);
        assert!(!validated.low_stock);
        assert_eq!(validated.sort_order, SortOrder::Asc);
    }

    #[test]
    fn test_validate_price_range_invalid() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: Some(10.0),
            max_price: Some(5.0),
            low_stock: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_rejects_non_positive_category() {
        let params = QueryParams {
            search: None,
            category_id: Some(0),
            min_price: None,
            max_price: None,
            low_stock: None,
            sort: None,
            order: None,
            page: None,
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }

    #[test]
    fn test_validate_pagination_param_zero() {
        let params = QueryParams {
            search: None,
            category_id: None,
            min_price: None,
            max_price: None,
            low_stock: None,
            sort: None,
            order: None,
            page: Some(0),
            limit: None,
        };

        assert!(QueryValidator::validate(params).is_err());
    }
}
