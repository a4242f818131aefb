pub mod use_debounced_search;
pub mod use_optimistic_mutation;
pub mod use_paginated_list;

pub use use_debounced_search::{use_debounced_search, UseDebouncedSearch};
pub use use_optimistic_mutation::{use_optimistic_mutation, MutationState, UseOptimisticMutation};
pub use use_paginated_list::{use_paginated_list, UsePaginatedList};
