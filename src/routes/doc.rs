use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        admin::{AdminLoginRequest, AdminSession, AuditLogList, Cleared},
        cart::{AddToCartRequest, CartView, CheckoutRequest, UpdateQuantityRequest},
        orders::{OrderList, OrderPlaced, UpdateOrderStatusRequest},
        plant_requests::{NewPlantRequest, PlantRequestCreated, PlantRequestList, UpdatePlantRequestStatus},
        plants::{CareGuideList, CategoryList, NewPlant, PlantList, PlantPatch},
        preferences::{LanguageState, PreferenceSource, SavePreferences},
    },
    models::{
        AuditLog, CareGuide, CartItem, Category, CustomerDetails, Language, Order, OrderItem,
        OrderStatus, Plant, PlantRequest, PlantRequestStatus,
    },
    response::{ApiResponse, Meta},
    routes::{admin, cart, health, orders, params, plant_requests, plants, preferences},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        plants::list_plants,
        plants::get_plant,
        plants::list_categories,
        plants::list_care_guides,
        cart::view_cart,
        cart::add_to_cart,
        cart::update_quantity,
        cart::remove_from_cart,
        cart::clear_cart,
        cart::checkout,
        orders::get_order,
        orders::get_order_by_number,
        plant_requests::submit_plant_request,
        preferences::get_preferences,
        preferences::save_preferences,
        admin::login,
        admin::logout,
        admin::list_all_orders,
        admin::update_order_status,
        admin::clear_orders,
        admin::create_plant,
        admin::update_plant,
        admin::delete_plant,
        admin::list_low_stock,
        admin::list_plant_requests,
        admin::update_plant_request_status,
        admin::clear_plant_requests,
        admin::list_audit_logs
    ),
    components(
        schemas(
            Plant,
            Category,
            CareGuide,
            CartItem,
            CustomerDetails,
            Order,
            OrderItem,
            OrderStatus,
            PlantRequest,
            PlantRequestStatus,
            Language,
            AuditLog,
            PlantList,
            CategoryList,
            CareGuideList,
            NewPlant,
            PlantPatch,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartView,
            CheckoutRequest,
            OrderList,
            OrderPlaced,
            UpdateOrderStatusRequest,
            NewPlantRequest,
            UpdatePlantRequestStatus,
            PlantRequestList,
            PlantRequestCreated,
            SavePreferences,
            LanguageState,
            PreferenceSource,
            AdminLoginRequest,
            AdminSession,
            AuditLogList,
            Cleared,
            params::Pagination,
            params::PlantQuery,
            params::PlantSortBy,
            params::OrderListQuery,
            Meta,
            ApiResponse<Plant>,
            ApiResponse<PlantList>,
            ApiResponse<CartView>,
            ApiResponse<Order>,
            ApiResponse<OrderList>,
            ApiResponse<LanguageState>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Plants", description = "Catalogue, categories and care guides"),
        (name = "Cart", description = "Session cart and checkout"),
        (name = "Orders", description = "Order tracking"),
        (name = "Plant Requests", description = "Requests for plants not in the catalogue"),
        (name = "Preferences", description = "Language preference"),
        (name = "Admin", description = "Admin endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
