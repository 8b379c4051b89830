//! Data access, borrowed per operation.
//!
//! A [`UnitOfWork`] wraps any [`ConnectionTrait`]: the pool for single
//! statements, or one `DatabaseTransaction` when several writes must commit
//! together. Repositories return raw `DbErr` so each caller decides how
//! infrastructure failures surface.

use sea_orm::ConnectionTrait;

pub mod category_repository;
pub mod client_repository;
pub mod product_repository;
pub mod sale_repository;

pub use category_repository::CategoryRepository;
pub use client_repository::ClientRepository;
pub use product_repository::ProductRepository;
pub use sale_repository::SaleRepository;

/// One page of rows plus the total row count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

pub struct UnitOfWork<'c, C> {
    conn: &'c C,
}

impl<'c, C: ConnectionTrait> UnitOfWork<'c, C> {
    pub fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    pub fn categories(&self) -> CategoryRepository<'c, C> {
        CategoryRepository::new(self.conn)
    }

    pub fn products(&self) -> ProductRepository<'c, C> {
        ProductRepository::new(self.conn)
    }

    pub fn clients(&self) -> ClientRepository<'c, C> {
        ClientRepository::new(self.conn)
    }

    pub fn sales(&self) -> SaleRepository<'c, C> {
        SaleRepository::new(self.conn)
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside `LIKE ... ESCAPE '\'`.
pub(crate) fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}


#[cfg(test)]
mod tests {
    use super::escape_like;

    #[test]
    fn escape_like_quotes_wildcards() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("cola"), "cola");
    }
}
