mod index_ranking;
