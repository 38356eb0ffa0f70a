//! Inventory tools

use std::sync::Arc;

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shopify_admin_client::AdminApi;

use super::PageArgs;
use crate::errors::ToolError;
use crate::graphql::{Document, Operation, ToolDescriptor, fetch_one, mutate};
use crate::validation::{Checks, Validate, page_size};

/// The most changes a single adjustment accepts
pub const MAX_CHANGES: usize = 250;

pub(crate) const GET_INVENTORY_LEVELS: Document = Document {
    operation_name: "GetInventoryLevels",
    source: concat!(
        "query GetInventoryLevels($id: ID!, $first: Int!, $after: String, $names: [String!]!) { inventoryItem(id: $id) { id sku tracked inventoryLevels(first: $first, after: $after) { edges { cursor node { id location { id name } quantities(names: $names) { name quantity } } } ",
        page_info!(),
        " } } }"
    ),
};

pub(crate) const ADJUST_INVENTORY: Document = Document {
    operation_name: "AdjustInventory",
    source: concat!(
        "mutation AdjustInventory($input: InventoryAdjustQuantitiesInput!) { inventoryAdjustQuantities(input: $input) { inventoryAdjustmentGroup { id createdAt reason referenceDocumentUri changes { name delta quantityAfterChange item { id } location { id name } } } ",
        coded_user_errors!(),
        " } }"
    ),
};

pub(crate) const DOCUMENTS: &[&Document] = &[&GET_INVENTORY_LEVELS, &ADJUST_INVENTORY];

pub(crate) fn tools(client: &Arc<dyn AdminApi>) -> Vec<Box<dyn ToolDescriptor>> {
    vec![
        GetInventoryLevels.bind(client.clone()),
        AdjustInventory.bind(client.clone()),
    ]
}

/// A named inventory quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuantityName {
    Available,
    Committed,
    Damaged,
    Incoming,
    OnHand,
    QualityControl,
    Reserved,
    SafetyStock,
}

/// Why an inventory quantity changed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentReason {
    Correction,
    CycleCountAvailable,
    Damaged,
    MovementCanceled,
    MovementCreated,
    MovementReceived,
    MovementUpdated,
    Other,
    Promotion,
    QualityControl,
    Received,
    ReservationCreated,
    ReservationDeleted,
    ReservationUpdated,
    Restock,
    SafetyStock,
    Shrinkage,
}

/// Quantities that can be adjusted directly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AdjustableQuantity {
    Available,
    Damaged,
    Incoming,
    QualityControl,
    Reserved,
    SafetyStock,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetInventoryLevelsInput {
    /// The inventory item's global ID, e.g. a variant's `inventoryItem.id`
    pub inventory_item_id: String,

    /// The quantities to report per location. Defaults to `available` and `on_hand`.
    pub quantity_names: Option<Vec<QuantityName>>,

    #[serde(flatten)]
    pub page: PageArgs,
}

impl Validate for GetInventoryLevelsInput {
    fn check(&self, checks: &mut Checks) {
        checks.min_len("inventory_item_id", &self.inventory_item_id, 1);
        if let Some(names) = &self.quantity_names {
            checks.items("quantity_names", names.len(), 1, 8);
        }
        self.page.check(checks);
    }
}

#[derive(Serialize)]
struct InventoryLevelsVariables<'a> {
    id: &'a str,
    first: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    after: Option<&'a str>,
    names: &'a [QuantityName],
}

pub struct GetInventoryLevels;

#[async_trait]
impl Operation for GetInventoryLevels {
    const NAME: &'static str = "get_inventory_levels";
    const DESCRIPTION: &'static str = "Get an inventory item's quantities at each location where it is stocked.";
    const READ_ONLY: bool = true;
    type Input = GetInventoryLevelsInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let names = input
            .quantity_names
            .as_deref()
            .unwrap_or(&[QuantityName::Available, QuantityName::OnHand]);
        let variables = InventoryLevelsVariables {
            id: &input.inventory_item_id,
            first: page_size(input.page.first),
            after: input.page.after.as_deref(),
            names,
        };
        fetch_one(
            client,
            &GET_INVENTORY_LEVELS,
            &variables,
            "inventoryItem",
            "InventoryItem",
            &input.inventory_item_id,
        )
        .await
    }
}

/// A change to one item's quantity at one location
#[derive(Debug, Deserialize, JsonSchema)]
pub struct InventoryChange {
    pub inventory_item_id: String,

    pub location_id: String,

    /// The amount to add, or subtract when negative. Must not be zero.
    pub delta: i64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct AdjustInventoryInput {
    pub reason: AdjustmentReason,

    /// The quantity to adjust
    pub name: AdjustableQuantity,

    /// A URI identifying the document that caused the change, e.g. `gid://my-app/PurchaseOrder/12`
    pub reference_document_uri: Option<String>,

    /// Between 1 and 250 changes, applied together
    #[schemars(length(min = 1, max = 250))]
    pub changes: Vec<InventoryChange>,
}

impl Validate for AdjustInventoryInput {
    fn check(&self, checks: &mut Checks) {
        checks.items("changes", self.changes.len(), 1, MAX_CHANGES);
        checks.optional_min_len("reference_document_uri", self.reference_document_uri.as_deref(), 1);
        for (index, change) in self.changes.iter().enumerate() {
            checks.min_len(&format!("changes[{index}].inventory_item_id"), &change.inventory_item_id, 1);
            checks.min_len(&format!("changes[{index}].location_id"), &change.location_id, 1);
            if change.delta == 0 {
                checks.violation(format!("changes[{index}].delta"), "must not be zero");
            }
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeInput<'a> {
    inventory_item_id: &'a str,
    location_id: &'a str,
    delta: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdjustQuantitiesInput<'a> {
    reason: AdjustmentReason,
    name: AdjustableQuantity,
    #[serde(skip_serializing_if = "Option::is_none")]
    reference_document_uri: Option<&'a str>,
    changes: Vec<ChangeInput<'a>>,
}

#[derive(Serialize)]
struct AdjustVariables<'a> {
    input: AdjustQuantitiesInput<'a>,
}

pub struct AdjustInventory;

#[async_trait]
impl Operation for AdjustInventory {
    const NAME: &'static str = "adjust_inventory";
    const DESCRIPTION: &'static str = "Adjust inventory quantities by relative amounts. All changes are applied in a single call.";
    const READ_ONLY: bool = false;
    type Input = AdjustInventoryInput;

    async fn execute(&self, client: &dyn AdminApi, input: Self::Input) -> Result<Value, ToolError> {
        let variables = AdjustVariables {
            input: AdjustQuantitiesInput {
                reason: input.reason,
                name: input.name,
                reference_document_uri: input.reference_document_uri.as_deref(),
                changes: input
                    .changes
                    .iter()
                    .map(|change| ChangeInput {
                        inventory_item_id: &change.inventory_item_id,
                        location_id: &change.location_id,
                        delta: change.delta,
                    })
                    .collect(),
            },
        };
        mutate(
            client,
            &ADJUST_INVENTORY,
            &variables,
            "inventoryAdjustQuantities",
            "inventoryAdjustmentGroup",
        )
        .await
    }
}
