pub mod product;

pub use product::{
    present, DescriptionBundle, DescriptionSource, ProcessedProduct, ProductFacts,
};
