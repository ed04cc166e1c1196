pub mod assets;
pub mod filter;
pub mod model;
pub mod pagination;

pub use assets::{AssetSource, CatalogAssets};
pub use filter::{filter_records, product_facets, Catalogued, ProductFacets};
pub use model::{Company, CompanyDetail, FilterCriteria, InformationDetail, Product, ProductDetail};
pub use pagination::{paginate, Pager, PAGE_SIZES};
