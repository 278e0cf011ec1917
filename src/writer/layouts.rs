//! Built-in field layouts, one per entity kind
//!
//! A layout fixes which fields are written and in which order. Scalar fields
//! become leaves; nested and list fields recurse into the registry strategy of
//! the related kind.

use crate::record::EntityKind;

/// One field of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSpec {
    /// Plain value
    Scalar(&'static str),
    /// Single related record
    Nested(&'static str, EntityKind),
    /// Related record collection
    List(&'static str, EntityKind),
}

impl FieldSpec {
    pub fn name(&self) -> &'static str {
        match self {
            FieldSpec::Scalar(name) | FieldSpec::Nested(name, _) | FieldSpec::List(name, _) => {
                name
            }
        }
    }
}

use FieldSpec::{List, Nested, Scalar};

pub const PRODUCT: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("Name"),
    Scalar("ShortDescription"),
    Scalar("FullDescription"),
    Scalar("Sku"),
    Scalar("ManufacturerPartNumber"),
    Scalar("Gtin"),
    Scalar("Price"),
    Scalar("OldPrice"),
    Scalar("ProductCost"),
    Scalar("SpecialPrice"),
    Scalar("SpecialPriceStartDateTimeUtc"),
    Scalar("SpecialPriceEndDateTimeUtc"),
    Scalar("StockQuantity"),
    Scalar("Weight"),
    Scalar("Length"),
    Scalar("Width"),
    Scalar("Height"),
    Scalar("Published"),
    Scalar("Deleted"),
    Scalar("LimitedToStores"),
    Scalar("CreatedOnUtc"),
    Scalar("UpdatedOnUtc"),
    List("ProductCategories", EntityKind::ProductCategory),
    List("ProductManufacturers", EntityKind::ProductManufacturer),
];

pub const PRODUCT_CATEGORY: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("CategoryId"),
    Scalar("IsFeaturedProduct"),
    Scalar("DisplayOrder"),
    Nested("Category", EntityKind::Category),
];

pub const PRODUCT_MANUFACTURER: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("ManufacturerId"),
    Scalar("IsFeaturedProduct"),
    Scalar("DisplayOrder"),
    Nested("Manufacturer", EntityKind::Manufacturer),
];

pub const CATEGORY: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("Name"),
    Scalar("Alias"),
    Scalar("Description"),
    Scalar("MetaKeywords"),
    Scalar("MetaDescription"),
    Scalar("MetaTitle"),
    Scalar("ParentCategoryId"),
    Scalar("PictureId"),
    Scalar("PageSize"),
    Scalar("ShowOnHomePage"),
    Scalar("Published"),
    Scalar("Deleted"),
    Scalar("DisplayOrder"),
    Scalar("LimitedToStores"),
    Scalar("CreatedOnUtc"),
    Scalar("UpdatedOnUtc"),
];

pub const MANUFACTURER: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("Name"),
    Scalar("Description"),
    Scalar("MetaKeywords"),
    Scalar("MetaDescription"),
    Scalar("MetaTitle"),
    Scalar("PictureId"),
    Scalar("PageSize"),
    Scalar("Published"),
    Scalar("Deleted"),
    Scalar("DisplayOrder"),
    Scalar("LimitedToStores"),
    Scalar("CreatedOnUtc"),
    Scalar("UpdatedOnUtc"),
];

pub const ADDRESS: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("FirstName"),
    Scalar("LastName"),
    Scalar("Email"),
    Scalar("Company"),
    Scalar("CountryId"),
    Scalar("StateProvinceId"),
    Scalar("City"),
    Scalar("Address1"),
    Scalar("Address2"),
    Scalar("ZipPostalCode"),
    Scalar("PhoneNumber"),
    Scalar("FaxNumber"),
    Scalar("CreatedOnUtc"),
];

pub const CUSTOMER: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("CustomerGuid"),
    Scalar("Username"),
    Scalar("Email"),
    Scalar("Active"),
    Scalar("Deleted"),
    Scalar("IsSystemAccount"),
    Scalar("AdminComment"),
    Scalar("IsTaxExempt"),
    Scalar("LastIpAddress"),
    Scalar("CreatedOnUtc"),
    Scalar("LastLoginDateUtc"),
    Scalar("LastActivityDateUtc"),
    Nested("BillingAddress", EntityKind::Address),
    Nested("ShippingAddress", EntityKind::Address),
    List("Addresses", EntityKind::Address),
];

pub const ORDER_ITEM: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("OrderItemGuid"),
    Scalar("OrderId"),
    Scalar("ProductId"),
    Scalar("Quantity"),
    Scalar("UnitPriceInclTax"),
    Scalar("UnitPriceExclTax"),
    Scalar("PriceInclTax"),
    Scalar("PriceExclTax"),
    Scalar("DiscountAmountInclTax"),
    Scalar("DiscountAmountExclTax"),
    Scalar("AttributeDescription"),
    Scalar("DownloadCount"),
    Scalar("IsDownloadActivated"),
    Scalar("ItemWeight"),
    Nested("Product", EntityKind::Product),
];

pub const ORDER: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("OrderNumber"),
    Scalar("OrderGuid"),
    Scalar("StoreId"),
    Scalar("CustomerId"),
    Scalar("OrderStatusId"),
    Scalar("PaymentStatusId"),
    Scalar("ShippingStatusId"),
    Scalar("CustomerCurrencyCode"),
    Scalar("CurrencyRate"),
    Scalar("OrderSubtotalInclTax"),
    Scalar("OrderSubtotalExclTax"),
    Scalar("OrderShippingInclTax"),
    Scalar("OrderShippingExclTax"),
    Scalar("OrderTax"),
    Scalar("OrderDiscount"),
    Scalar("OrderTotal"),
    Scalar("RefundedAmount"),
    Scalar("CustomerIp"),
    Scalar("PaymentMethodSystemName"),
    Scalar("ShippingMethod"),
    Scalar("Deleted"),
    Scalar("CreatedOnUtc"),
    Nested("Customer", EntityKind::Customer),
    Nested("BillingAddress", EntityKind::Address),
    Nested("ShippingAddress", EntityKind::Address),
    List("OrderItems", EntityKind::OrderItem),
];

pub const NEWSLETTER_SUBSCRIPTION: &[FieldSpec] = &[
    Scalar("Id"),
    Scalar("NewsLetterSubscriptionGuid"),
    Scalar("Email"),
    Scalar("Active"),
    Scalar("StoreId"),
    Scalar("CreatedOnUtc"),
];

/// Built-in layout of an entity kind
pub fn layout(kind: EntityKind) -> &'static [FieldSpec] {
    match kind {
        EntityKind::Address => ADDRESS,
        EntityKind::Category => CATEGORY,
        EntityKind::Customer => CUSTOMER,
        EntityKind::Manufacturer => MANUFACTURER,
        EntityKind::NewsletterSubscription => NEWSLETTER_SUBSCRIPTION,
        EntityKind::Order => ORDER,
        EntityKind::OrderItem => ORDER_ITEM,
        EntityKind::Product => PRODUCT,
        EntityKind::ProductCategory => PRODUCT_CATEGORY,
        EntityKind::ProductManufacturer => PRODUCT_MANUFACTURER,
    }
}

/// Names of the scalar fields of a layout, in order
pub fn scalar_fields(kind: EntityKind) -> impl Iterator<Item = &'static str> {
    layout(kind).iter().filter_map(|spec| match spec {
        FieldSpec::Scalar(name) => Some(*name),
        _ => None,
    })
}
