pub mod activity;
pub mod activity_image;
pub mod activity_video;
pub mod customer;
pub mod discount;
pub mod order;
pub mod publish;

pub use activity::Entity as ActivityEntity;
pub use activity_image::Entity as ActivityImageEntity;
pub use activity_video::Entity as ActivityVideoEntity;
pub use customer::Entity as CustomerEntity;
pub use discount::Entity as DiscountEntity;
pub use order::Entity as OrderEntity;
pub use publish::Entity as PublishEntity;
