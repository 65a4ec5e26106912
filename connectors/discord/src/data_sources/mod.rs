//! Read-only data sources.

mod channel;
mod color;
mod emoji;
mod member;
mod role;
mod server;

pub use channel::{
    CategoryDataModel, CategoryDataSource, ChannelDataModel, ChannelDataSource, ChannelSummary,
    ChannelsDataModel, ChannelsDataSource,
};
pub use color::{ColorDataModel, ColorDataSource};
pub use emoji::{EmojiDataModel, EmojiDataSource, EmojiSummary, EmojisDataModel, EmojisDataSource};
pub use member::{MemberDataModel, MemberDataSource, MemberSummary, MembersDataModel, MembersDataSource};
pub use role::{RoleDataModel, RoleDataSource, RoleSummary, RolesDataModel, RolesDataSource};
pub use server::{ServerDataModel, ServerDataSource, ServerSummary, ServersDataModel, ServersDataSource};

/// Returns the value when it is present and non-empty.
fn given(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
