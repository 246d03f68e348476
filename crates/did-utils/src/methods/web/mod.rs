pub(super) mod resolver;
